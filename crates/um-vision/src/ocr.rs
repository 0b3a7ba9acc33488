use image::{DynamicImage, GrayImage, ImageFormat};
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, warn};
use um_result::MatchError;

/// Anything that can turn an image of text into a string.
pub trait OcrEngine: Send + Sync {
    fn image_to_string(&self, image: &GrayImage) -> Result<String, MatchError>;
}

/// Runs the `tesseract` command line, piping the image through stdin.
pub struct TesseractCli {
    cmd: PathBuf,
    available: bool,
}

impl TesseractCli {
    pub fn new(cmd: impl Into<PathBuf>) -> Self {
        let cmd = cmd.into();
        let available = check_tesseract(&cmd);
        if available {
            debug!("Tesseract OCR available at {}", cmd.display());
        } else {
            warn!(
                "Tesseract not found at {}. Title parsing will fail until it is installed",
                cmd.display()
            );
        }
        Self { cmd, available }
    }

    pub fn is_available(&self) -> bool {
        self.available
    }
}

impl Default for TesseractCli {
    fn default() -> Self {
        Self::new("tesseract")
    }
}

impl OcrEngine for TesseractCli {
    fn image_to_string(&self, image: &GrayImage) -> Result<String, MatchError> {
        let mut png = Vec::new();
        DynamicImage::ImageLuma8(image.clone())
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .map_err(|e| MatchError::Ocr(format!("failed to encode image: {}", e)))?;

        let mut child = Command::new(&self.cmd)
            .args(["stdin", "stdout", "-l", "eng"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| MatchError::Ocr(format!("failed to run {}: {}", self.cmd.display(), e)))?;

        // stdin is dropped before waiting, so the child always sees EOF and gets reaped
        let written = match child.stdin.take() {
            Some(mut stdin) => stdin.write_all(&png),
            None => Ok(()),
        };

        let output = child
            .wait_with_output()
            .map_err(|e| MatchError::Ocr(format!("tesseract did not finish: {}", e)))?;
        written.map_err(|e| MatchError::Ocr(format!("failed to write image: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(MatchError::Ocr(stderr.trim().to_string()));
        }

        let text = String::from_utf8_lossy(&output.stdout).into_owned();
        debug!("OCR result: {:?}", text);
        Ok(text)
    }
}

/// Check if Tesseract is installed and accessible
fn check_tesseract(cmd: &Path) -> bool {
    Command::new(cmd)
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_binary_is_unavailable() {
        let engine = TesseractCli::new("/nonexistent/tesseract");
        assert!(!engine.is_available());

        let err = engine.image_to_string(&GrayImage::new(4, 4)).unwrap_err();
        assert!(matches!(err, MatchError::Ocr(_)));
    }

    #[cfg(unix)]
    #[test]
    fn test_write_failure_waits_for_child() {
        // `true` exits without reading, so writing a large image hits a closed pipe
        let engine = TesseractCli::new("true");
        let noise = GrayImage::from_fn(1000, 1000, |x, y| {
            let v = x.wrapping_mul(2_654_435_761) ^ y.wrapping_mul(40_503);
            image::Luma([v.rotate_left(x % 13) as u8])
        });

        let err = engine.image_to_string(&noise).unwrap_err();
        assert!(
            matches!(err, MatchError::Ocr(ref msg) if msg.starts_with("failed to write image")),
            "got {:?}",
            err
        );
    }

    #[test]
    #[ignore = "needs a tesseract install"]
    fn test_reads_blank_image() {
        let engine = TesseractCli::default();
        let blank = GrayImage::from_pixel(60, 20, image::Luma([255]));
        let text = engine.image_to_string(&blank).unwrap();
        assert!(text.trim().is_empty());
    }
}
