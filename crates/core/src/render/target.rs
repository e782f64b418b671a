//! Off-screen trail buffer: a framebuffer with one color texture.

use super::context::TrailFormat;

/// One of the two ping-ponged trail buffers.
///
/// GL objects are not freed on drop; call [`destroy`](Self::destroy) while
/// the context is still current.
pub struct TrailTarget {
    fbo: glow::Framebuffer,
    texture: glow::Texture,
    format: TrailFormat,
    width: u32,
    height: u32,
}

/// Allocates an empty texture. NEAREST keeps the fade copy pixel-exact.
#[allow(unsafe_code)]
fn allocate_texture(
    gl: &glow::Context,
    format: TrailFormat,
    width: u32,
    height: u32,
) -> Result<glow::Texture, String> {
    use glow::HasContext;

    // SAFETY: the texture is freshly created and only configured here.
    unsafe {
        let texture = gl.create_texture()?;
        gl.bind_texture(glow::TEXTURE_2D, Some(texture));
        for (param, value) in [
            (glow::TEXTURE_WRAP_S, glow::CLAMP_TO_EDGE),
            (glow::TEXTURE_WRAP_T, glow::CLAMP_TO_EDGE),
            (glow::TEXTURE_MIN_FILTER, glow::NEAREST),
            (glow::TEXTURE_MAG_FILTER, glow::NEAREST),
        ] {
            gl.tex_parameter_i32(glow::TEXTURE_2D, param, value as i32);
        }
        gl.tex_image_2d(
            glow::TEXTURE_2D,
            0,
            format.internal_format() as i32,
            width as i32,
            height as i32,
            0,
            glow::RGBA,
            format.pixel_type(),
            glow::PixelUnpackData::Slice(None),
        );
        gl.bind_texture(glow::TEXTURE_2D, None);
        Ok(texture)
    }
}

/// Attaches `texture` to `fbo` and reports whether the result is complete.
#[allow(unsafe_code)]
fn attach(gl: &glow::Context, fbo: glow::Framebuffer, texture: glow::Texture) -> Result<(), String> {
    use glow::HasContext;

    // SAFETY: both handles are live objects of this context.
    unsafe {
        gl.bind_framebuffer(glow::FRAMEBUFFER, Some(fbo));
        gl.framebuffer_texture_2d(
            glow::FRAMEBUFFER,
            glow::COLOR_ATTACHMENT0,
            glow::TEXTURE_2D,
            Some(texture),
            0,
        );
        let status = gl.check_framebuffer_status(glow::FRAMEBUFFER);
        gl.bind_framebuffer(glow::FRAMEBUFFER, None);
        if status == glow::FRAMEBUFFER_COMPLETE {
            Ok(())
        } else {
            Err(format!("trail framebuffer incomplete: status 0x{status:04X}"))
        }
    }
}

impl TrailTarget {
    /// Creates a cleared target.
    #[allow(unsafe_code)]
    pub fn new(
        gl: &glow::Context,
        format: TrailFormat,
        width: u32,
        height: u32,
    ) -> Result<Self, String> {
        use glow::HasContext;

        let texture = allocate_texture(gl, format, width, height)?;
        // SAFETY: creates a new object on the context that made `texture`.
        let fbo = match unsafe { gl.create_framebuffer() } {
            Ok(fbo) => fbo,
            Err(e) => {
                // SAFETY: `texture` is not attached to anything yet.
                unsafe { gl.delete_texture(texture) };
                return Err(e);
            }
        };
        if let Err(e) = attach(gl, fbo, texture) {
            // SAFETY: both objects were created above and are owned by no one else.
            unsafe {
                gl.delete_framebuffer(fbo);
                gl.delete_texture(texture);
            }
            return Err(e);
        }

        let target = Self {
            fbo,
            texture,
            format,
            width,
            height,
        };
        target.clear(gl);
        Ok(target)
    }

    /// Makes this the draw target with a matching viewport.
    #[allow(unsafe_code)]
    pub fn bind(&self, gl: &glow::Context) {
        use glow::HasContext;

        // SAFETY: self.fbo is live until destroy().
        unsafe {
            gl.bind_framebuffer(glow::FRAMEBUFFER, Some(self.fbo));
            gl.viewport(0, 0, self.width as i32, self.height as i32);
        }
    }

    /// Fills the buffer with transparent black and unbinds it.
    #[allow(unsafe_code)]
    pub fn clear(&self, gl: &glow::Context) {
        use glow::HasContext;

        self.bind(gl);
        // SAFETY: clears the framebuffer bound just above.
        unsafe {
            gl.clear_color(0.0, 0.0, 0.0, 0.0);
            gl.clear(glow::COLOR_BUFFER_BIT);
            gl.bind_framebuffer(glow::FRAMEBUFFER, None);
        }
    }

    pub fn texture(&self) -> glow::Texture {
        self.texture
    }

    pub fn format(&self) -> TrailFormat {
        self.format
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Swaps in a cleared texture of the new size.
    ///
    /// On failure the old texture stays attached and the target is unchanged.
    #[allow(unsafe_code)]
    pub fn resize(&mut self, gl: &glow::Context, width: u32, height: u32) -> Result<(), String> {
        use glow::HasContext;

        let texture = allocate_texture(gl, self.format, width, height)?;
        if let Err(e) = attach(gl, self.fbo, texture) {
            // Restore the previous attachment before discarding the new one.
            let _ = attach(gl, self.fbo, self.texture);
            // SAFETY: `texture` is not attached anywhere any more.
            unsafe { gl.delete_texture(texture) };
            return Err(e);
        }
        // SAFETY: the new texture replaced the old one as the attachment.
        unsafe { gl.delete_texture(self.texture) };

        self.texture = texture;
        self.width = width;
        self.height = height;
        self.clear(gl);
        Ok(())
    }

    #[allow(unsafe_code)]
    pub fn destroy(&self, gl: &glow::Context) {
        use glow::HasContext;

        // SAFETY: handles are live until this call.
        unsafe {
            gl.delete_framebuffer(self.fbo);
            gl.delete_texture(self.texture);
        }
    }
}
