//! # Framebuffer Text Console
//!
//! Renders PSF1 glyphs (8 pixels wide, `char_size` rows) onto the linear
//! framebuffer. Pixels are 32-bit `0x00RRGGBB`. Only set glyph bits are drawn;
//! [`Console::clear`] paints the background. The screen scrolls by one text
//! row when the cursor runs off the bottom.
//!
//! Drawing is done through the framebuffer's physical address, so the console
//! must not print before the framebuffer is identity mapped: the firmware's
//! map covers it on entry and bring-up step 4 keeps it mapped.

use core::fmt;
use kernel_bringup::Console;
use kernel_info::boot::{FramebufferInfo, Psf1Font, Psf1Header};
use spin::Mutex;

const GLYPH_WIDTH: u32 = 8;
const DEFAULT_FOREGROUND: u32 = 0x00FF_FFFF;
const DEFAULT_BACKGROUND: u32 = 0x0000_0000;

static CONSOLE: Mutex<Option<FramebufferConsole>> = Mutex::new(None);

#[derive(Clone, Copy)]
struct Font {
    glyphs: u64,
    height: u32,
}

pub struct FramebufferConsole {
    base: u64,
    width: u32,
    height: u32,
    stride: u32,
    font: Option<Font>,
    x: u32,
    y: u32,
    foreground: u32,
    background: u32,
}

impl FramebufferConsole {
    /// # Safety
    /// `font.header`, if non-null, must point at a readable PSF1 header.
    unsafe fn new(fb: &FramebufferInfo, font: &Psf1Font) -> Self {
        let font = (font.header != 0)
            .then(|| unsafe { (font.header as *const Psf1Header).read_unaligned() })
            .filter(Psf1Header::is_valid)
            .map(|header| Font {
                glyphs: font.glyphs,
                height: u32::from(header.char_size),
            });
        if font.is_none() {
            log::warn!("no usable PSF1 font; console output is serial only");
        }

        Self {
            base: fb.base,
            width: fb.width,
            height: fb.height,
            stride: fb.pixels_per_scanline,
            font,
            x: 0,
            y: 0,
            foreground: DEFAULT_FOREGROUND,
            background: DEFAULT_BACKGROUND,
        }
    }

    fn pixel(&self, x: u32, y: u32) -> *mut u32 {
        let offset = u64::from(y) * u64::from(self.stride) + u64::from(x);
        (self.base as *mut u32).wrapping_add(offset as usize)
    }

    fn fill_rows(&mut self, from: u32, to: u32, colour: u32) {
        for y in from..to.min(self.height) {
            for x in 0..self.width {
                // SAFETY: inside the visible framebuffer.
                unsafe { self.pixel(x, y).write_volatile(colour) };
            }
        }
    }

    fn scroll(&mut self, rows: u32) {
        let rows = rows.min(self.height);
        let keep = self.height - rows;
        // SAFETY: both ranges lie inside the framebuffer; `copy` allows overlap.
        unsafe {
            core::ptr::copy(
                self.pixel(0, rows),
                self.pixel(0, 0),
                keep as usize * self.stride as usize,
            );
        }
        self.fill_rows(keep, self.height, self.background);
    }

    fn newline(&mut self, line_height: u32) {
        self.x = 0;
        self.y += line_height;
        if self.y + line_height > self.height {
            self.scroll(line_height);
            self.y -= line_height;
        }
    }

    fn put_char(&mut self, c: u8) {
        let Some(Font { glyphs, height }) = self.font else {
            return;
        };

        match c {
            b'\n' => return self.newline(height),
            b'\r' => {
                self.x = 0;
                return;
            }
            _ => {}
        }

        if self.x + GLYPH_WIDTH > self.width {
            self.newline(height);
        }

        let glyph = glyphs + u64::from(c) * u64::from(height);
        for row in 0..height {
            // SAFETY: PSF1 fonts hold 256 glyphs of `height` bytes.
            let bits = unsafe { ((glyph + u64::from(row)) as *const u8).read() };
            for col in 0..GLYPH_WIDTH {
                if bits & (0x80 >> col) != 0 {
                    // SAFETY: the cursor keeps the glyph cell on screen.
                    unsafe { self.pixel(self.x + col, self.y + row).write_volatile(self.foreground) };
                }
            }
        }
        self.x += GLYPH_WIDTH;
    }
}

impl fmt::Write for FramebufferConsole {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for b in s.bytes() {
            self.put_char(if b.is_ascii() { b } else { b'?' });
        }
        Ok(())
    }
}

impl Console for FramebufferConsole {
    fn clear(&mut self, background: u32) {
        self.background = background;
        self.fill_rows(0, self.height, background);
    }

    fn home(&mut self) {
        self.x = 0;
        self.y = 0;
    }

    fn set_foreground(&mut self, colour: u32) {
        self.foreground = colour;
    }
}

/// Set up the global console.
///
/// # Safety
/// See [`FramebufferConsole::new`]; the framebuffer must be mapped.
pub unsafe fn init(fb: &FramebufferInfo, font: &Psf1Font) {
    *CONSOLE.lock() = Some(unsafe { FramebufferConsole::new(fb, font) });
}

/// Release the console lock held by whoever was interrupted.
///
/// # Safety
/// Only for the panic path, after which the previous holder never runs again.
pub unsafe fn force_unlock() {
    if CONSOLE.is_locked() {
        unsafe { CONSOLE.force_unlock() };
    }
}

/// Handle to the global console; output is dropped until [`init`] ran.
pub struct Screen;

impl Screen {
    fn with(f: impl FnOnce(&mut FramebufferConsole)) {
        if let Some(console) = CONSOLE.lock().as_mut() {
            f(console);
        }
    }
}

impl fmt::Write for Screen {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        Self::with(|c| {
            // Rendering itself cannot fail.
            let _ = fmt::Write::write_str(c, s);
        });
        Ok(())
    }
}

impl Console for Screen {
    fn clear(&mut self, background: u32) {
        Self::with(|c| c.clear(background));
    }

    fn home(&mut self) {
        Self::with(FramebufferConsole::home);
    }

    fn set_foreground(&mut self, colour: u32) {
        Self::with(|c| c.set_foreground(colour));
    }
}
