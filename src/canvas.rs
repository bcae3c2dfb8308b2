use std::io::{ self, BufWriter, Read, Write };
use std::fs::File;
use std::path::Path;

use crate::color::Color;
use crate::error::{ Error, Result };

/// PPM readers wrap ASCII pixel data at this many columns.
const PPM_LINE_WIDTH: usize = 70;

/// The rendered image: `width * height` colours, stored row by row.
///
/// Images are written and read as PPM, either the ASCII (`P3`) or the binary
/// (`P6`) flavour.
#[derive(Clone, Default, Debug, PartialEq)]
pub struct Canvas {
    /// The width of the canvas, in pixels.
    pub width: usize,

    /// The height of the canvas, in pixels.
    pub height: usize,

    pixels: Vec<Color>,
}

impl Canvas {
    /// Creates a black canvas with the given width and height.
    pub fn new(width: usize, height: usize) -> Canvas {
        Canvas {
            width,
            height,
            pixels: vec![Color::black(); width * height]
        }
    }

    pub fn pixels(&self) -> &[Color] {
        &self.pixels
    }

    /// Writes a color to a location on the `Canvas`.
    ///
    /// Out-of-bounds pixels are ignored. `x` is the column and `y` the row,
    /// both zero-indexed.
    ///
    /// ```
    /// # use whitted::color::Color;
    /// # use whitted::canvas::Canvas;
    /// let purple = Color::rgb(1.0, 0.0, 1.0);
    /// let mut canvas = Canvas::new(8, 8);
    /// canvas.write_pixel(4, 2, &purple);
    /// assert_eq!(canvas.read_pixel(4, 2), Some(purple));
    /// ```
    pub fn write_pixel(&mut self, x: usize, y: usize, pixel: &Color) {
        if x >= self.width || y >= self.height {
            return;
        }

        self.pixels[(y * self.width) + x] = *pixel;
    }

    /// Reads a color from a location on the `Canvas`, or `None` when the
    /// location is out of bounds.
    pub fn read_pixel(&self, x: usize, y: usize) -> Option<Color> {
        if x >= self.width || y >= self.height {
            return None
        }

        Some(self.pixels[(y * self.width) + x])
    }

    /// Writes an ASCII (`P3`) PPM image.
    ///
    /// Every row starts on a new line, and no line exceeds 70 columns; a
    /// value that would cross the limit moves to the next line.
    pub fn write_ppm<W: Write>(&self, out: &mut W) -> Result<()> {
        writeln!(out, "P3")?;
        writeln!(out, "{} {}", self.width, self.height)?;
        writeln!(out, "255")?;

        for row in self.pixels.chunks(self.width.max(1)) {
            let mut line = String::new();

            for value in row.iter().flat_map(|p| p.to_bytes()) {
                let token = value.to_string();

                if !line.is_empty() && line.len() + 1 + token.len() > PPM_LINE_WIDTH {
                    writeln!(out, "{}", line)?;
                    line.clear();
                }

                if !line.is_empty() {
                    line.push(' ');
                }
                line.push_str(&token);
            }

            writeln!(out, "{}", line)?;
        }

        Ok(())
    }

    /// Writes a binary (`P6`) PPM image with 8-bit channels.
    pub fn write_ppm_binary<W: Write>(&self, out: &mut W) -> Result<()> {
        write!(out, "P6\n{} {}\n255\n", self.width, self.height)?;

        let data: Vec<u8> = self.pixels.iter()
            .flat_map(|p| p.to_bytes())
            .collect();
        out.write_all(&data)?;

        Ok(())
    }

    /// Saves the canvas to `path`, as `P6` when `binary` is set and `P3`
    /// otherwise.
    pub fn save<P: AsRef<Path>>(&self, path: P, binary: bool) -> Result<()> {
        let mut out = BufWriter::new(File::create(path)?);

        if binary {
            self.write_ppm_binary(&mut out)?;
        } else {
            self.write_ppm(&mut out)?;
        }

        out.flush()?;
        Ok(())
    }

    /// Reads a `P3` or `P6` PPM image. Comments in the header (and, for
    /// `P3`, among the pixel values) are skipped.
    pub fn read_ppm<R: Read>(input: &mut R) -> Result<Canvas> {
        let mut bytes = Vec::new();
        input.read_to_end(&mut bytes)?;

        let mut tokens = PpmTokens { bytes: &bytes, pos: 0 };

        let magic = tokens.next_token()
            .ok_or_else(|| Error::Ppm("empty file".into()))?;
        let binary = match magic {
            "P3" => false,
            "P6" => true,
            other => return Err(Error::Ppm(
                format!("unsupported magic number {:?}", other)
            )),
        };

        let width = tokens.next_number("width")?;
        let height = tokens.next_number("height")?;
        let max = tokens.next_number("maximum color value")?;

        if max == 0 || max > usize::from(u16::MAX) {
            return Err(Error::Ppm(format!("maximum color value {} out of range", max)));
        }
        let max = max as u16;

        let samples = width.checked_mul(height)
            .and_then(|n| n.checked_mul(3))
            .ok_or_else(|| Error::Ppm("image dimensions overflow".into()))?;

        let values = if binary {
            // Exactly one whitespace byte separates the header from the data.
            let start = tokens.pos + 1;
            let wide = max > 255;
            let end = samples.checked_mul(if wide { 2 } else { 1 })
                .and_then(|needed| needed.checked_add(start))
                .ok_or_else(|| Error::Ppm("image dimensions overflow".into()))?;

            let data = bytes.get(start..end)
                .ok_or_else(|| Error::Ppm("truncated pixel data".into()))?;

            if wide {
                data.chunks(2)
                    .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                    .collect()
            } else {
                data.iter().map(|&b| u16::from(b)).collect()
            }
        } else {
            let mut values = Vec::with_capacity(samples.min(1 << 20));
            for _ in 0..samples {
                let v = tokens.next_number("pixel value")?;
                if v > usize::from(max) {
                    return Err(Error::Ppm(
                        format!("pixel value {} exceeds maximum {}", v, max)
                    ));
                }
                values.push(v as u16);
            }

            values
        };

        if let Some(v) = values.iter().find(|&&v| v > max) {
            return Err(Error::Ppm(format!("pixel value {} exceeds maximum {}", v, max)));
        }

        let mut canvas = Canvas::new(width, height);
        for (i, rgb) in values.chunks(3).enumerate() {
            canvas.pixels[i] = Color::from_bytes(rgb[0], rgb[1], rgb[2], max);
        }

        Ok(canvas)
    }

    /// Loads a PPM image from `path`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Canvas> {
        let mut f = io::BufReader::new(File::open(path)?);
        Canvas::read_ppm(&mut f)
    }
}

/// Whitespace-separated tokens of a PPM file, skipping `#` comments.
struct PpmTokens<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> PpmTokens<'a> {
    fn next_token(&mut self) -> Option<&'a str> {
        loop {
            while self.pos < self.bytes.len() && self.bytes[self.pos].is_ascii_whitespace() {
                self.pos += 1;
            }

            if self.bytes.get(self.pos) == Some(&b'#') {
                while self.pos < self.bytes.len() && self.bytes[self.pos] != b'\n' {
                    self.pos += 1;
                }
                continue;
            }

            break;
        }

        let start = self.pos;
        while self.pos < self.bytes.len() && !self.bytes[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }

        if start == self.pos {
            None
        } else {
            std::str::from_utf8(&self.bytes[start..self.pos]).ok()
        }
    }

    fn next_number(&mut self, what: &str) -> Result<usize> {
        let token = self.next_token()
            .ok_or_else(|| Error::Ppm(format!("missing {}", what)))?;

        token.parse()
            .map_err(|_| Error::Ppm(format!("invalid {} {:?}", what, token)))
    }
}

#[cfg(test)]
fn ppm_string(c: &Canvas) -> String {
    let mut out = Vec::new();
    c.write_ppm(&mut out).unwrap();
    String::from_utf8(out).unwrap()
}

#[test]
fn creating_a_canvas() {
    let c = Canvas::new(10, 20);

    assert_eq!(c.width, 10);
    assert_eq!(c.height, 20);
    assert!(c.pixels().iter().all(|&p| p == Color::black()));
    assert_eq!(c.read_pixel(10, 0), None);
}

#[test]
fn ppm_header_and_pixel_data() {
    let mut c = Canvas::new(5, 3);
    c.write_pixel(0, 0, &Color::rgb(1.5, 0.0, 0.0));
    c.write_pixel(2, 1, &Color::rgb(0.0, 0.5, 0.0));
    c.write_pixel(4, 2, &Color::rgb(-0.5, 0.0, 1.0));

    let ppm = ppm_string(&c);
    let lines: Vec<&str> = ppm.lines().collect();

    assert_eq!(&lines[0..3], &["P3", "5 3", "255"]);
    assert_eq!(lines[3], "255 0 0 0 0 0 0 0 0 0 0 0 0 0 0");
    assert_eq!(lines[4], "0 0 0 0 0 0 0 128 0 0 0 0 0 0 0");
    assert_eq!(lines[5], "0 0 0 0 0 0 0 0 0 0 0 0 0 0 255");
}

#[test]
fn ppm_splits_long_lines() {
    let mut c = Canvas::new(10, 2);
    for y in 0..2 {
        for x in 0..10 {
            c.write_pixel(x, y, &Color::rgb(1.0, 0.8, 0.6));
        }
    }

    let ppm = ppm_string(&c);
    let lines: Vec<&str> = ppm.lines().collect();

    assert_eq!(lines[3],
        "255 204 153 255 204 153 255 204 153 255 204 153 255 204 153 255 204");
    assert_eq!(lines[4],
        "153 255 204 153 255 204 153 255 204 153 255 204 153");
    assert_eq!(lines[5],
        "255 204 153 255 204 153 255 204 153 255 204 153 255 204 153 255 204");
    assert_eq!(lines[6],
        "153 255 204 153 255 204 153 255 204 153 255 204 153");
    assert!(lines.iter().all(|l| l.len() <= 70));
}

#[test]
fn ppm_ends_with_newline() {
    assert!(ppm_string(&Canvas::new(5, 3)).ends_with('\n'));
}

#[test]
fn reading_ascii_ppm_with_comments() {
    let src = "P3\n# a comment\n2 1\n# another\n100\n100 50 0\n# mid\n0 25 100\n";
    let c = Canvas::read_ppm(&mut src.as_bytes()).unwrap();

    assert_eq!((c.width, c.height), (2, 1));
    assert_eq!(c.read_pixel(0, 0), Some(Color::rgb(1.0, 0.5, 0.0)));
    assert_eq!(c.read_pixel(1, 0), Some(Color::rgb(0.0, 0.25, 1.0)));
}

#[test]
fn reading_binary_ppm() {
    let mut src = b"P6\n2 1\n255\n".to_vec();
    src.extend_from_slice(&[255, 0, 51, 0, 255, 0]);
    let c = Canvas::read_ppm(&mut src.as_slice()).unwrap();

    assert_eq!(c.read_pixel(0, 0), Some(Color::rgb(1.0, 0.0, 0.2)));
    assert_eq!(c.read_pixel(1, 0), Some(Color::rgb(0.0, 1.0, 0.0)));
}

#[test]
fn malformed_ppm_is_an_error() {
    let bad = [
        "P2\n1 1\n255\n0\n",
        "P3\n1\n",
        "P3\n1 1\n255\n0 0\n",
        "P3\n1 1\n255\n0 0 300\n",
        "P3\n1 x\n255\n",
    ];

    for src in bad.iter() {
        assert!(matches!(Canvas::read_ppm(&mut src.as_bytes()), Err(Error::Ppm(_))),
            "{:?}", src);
    }

    let truncated = b"P6\n2 1\n255\n\x00\x00".to_vec();
    assert!(Canvas::read_ppm(&mut truncated.as_slice()).is_err());
}

#[test]
fn oversized_binary_header_is_an_error() {
    // The sample count fits in a usize, but the end of the 16-bit data,
    // measured from the start of the file, does not.
    let huge = b"P6\n3074457345618258602 1\n65535\n\x00\x00".to_vec();
    assert!(matches!(Canvas::read_ppm(&mut huge.as_slice()), Err(Error::Ppm(_))));

    let huge = b"P6\n3074457345618258602 2\n255\n\x00\x00".to_vec();
    assert!(matches!(Canvas::read_ppm(&mut huge.as_slice()), Err(Error::Ppm(_))));
}

#[test]
fn ppm_round_trips_within_quantization() {
    let mut c = Canvas::new(4, 3);
    for y in 0..3 {
        for x in 0..4 {
            let v = (x + y * 4) as f64 / 11.0;
            c.write_pixel(x, y, &Color::rgb(v, 1.0 - v, v * 0.5));
        }
    }

    let mut ascii = Vec::new();
    c.write_ppm(&mut ascii).unwrap();
    let mut binary = Vec::new();
    c.write_ppm_binary(&mut binary).unwrap();

    for bytes in [ascii, binary].iter() {
        let back = Canvas::read_ppm(&mut bytes.as_slice()).unwrap();

        for (a, b) in c.pixels().iter().zip(back.pixels()) {
            assert!((a.r - b.r).abs() <= 1.0 / 255.0);
            assert!((a.g - b.g).abs() <= 1.0 / 255.0);
            assert!((a.b - b.b).abs() <= 1.0 / 255.0);
        }
    }
}
