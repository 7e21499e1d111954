use thiserror::Error;

use crate::capture::domain::image_encoder::ImageEncoder;
use crate::capture::infrastructure::jpeg_image_encoder::JpegImageEncoder;
use crate::shared::captured_image::CapturedImage;
use crate::shared::config::CaptureConfig;
use crate::shared::constants::{DEFAULT_MIN_ENCODED_BYTES, DEFAULT_MIN_RESOLUTION};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QualityError {
    #[error("photo quality is too low ({resolution}px long edge, {encoded_bytes} bytes)")]
    LowQuality {
        resolution: u32,
        encoded_bytes: usize,
    },
    #[error("photo could not be encoded: {0}")]
    Encoding(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QualityVerdict {
    Accepted,
    Rejected(QualityError),
}

impl QualityVerdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }
}

/// Post-capture quality gate.
///
/// Measures the still at its worst-case size (encoded at maximum quality)
/// so a downstream recompression can't push a borderline photo under the
/// threshold unnoticed. Accepts iff the long edge and the encoded size
/// both reach their minimums.
pub struct QualityValidator {
    encoder: Box<dyn ImageEncoder>,
    min_resolution: u32,
    min_encoded_bytes: usize,
}

impl QualityValidator {
    pub fn new(
        encoder: Box<dyn ImageEncoder>,
        min_resolution: u32,
        min_encoded_bytes: usize,
    ) -> Self {
        Self {
            encoder,
            min_resolution,
            min_encoded_bytes,
        }
    }

    pub fn from_config(config: &CaptureConfig) -> Self {
        Self::new(
            Box::new(JpegImageEncoder::new(config.jpeg_quality)),
            config.min_resolution,
            config.min_encoded_bytes,
        )
    }

    pub fn min_resolution(&self) -> u32 {
        self.min_resolution
    }

    pub fn min_encoded_bytes(&self) -> usize {
        self.min_encoded_bytes
    }

    pub fn validate(&self, image: &CapturedImage) -> QualityVerdict {
        match self.check(image) {
            Ok(()) => QualityVerdict::Accepted,
            Err(e) => QualityVerdict::Rejected(e),
        }
    }

    pub fn check(&self, image: &CapturedImage) -> Result<(), QualityError> {
        let encoded_bytes = self
            .encoder
            .encoded_len(image)
            .map_err(|e| QualityError::Encoding(e.to_string()))?;
        let resolution = image.long_edge();

        if resolution >= self.min_resolution && encoded_bytes >= self.min_encoded_bytes {
            Ok(())
        } else {
            Err(QualityError::LowQuality {
                resolution,
                encoded_bytes,
            })
        }
    }
}

impl Default for QualityValidator {
    fn default() -> Self {
        Self::new(
            Box::<JpegImageEncoder>::default(),
            DEFAULT_MIN_RESOLUTION,
            DEFAULT_MIN_ENCODED_BYTES,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::domain::face_detector::BoxError;
    use image::RgbImage;
    use rstest::rstest;

    /// Reports a fixed encoded size regardless of content.
    struct FixedSizeEncoder(usize);

    impl ImageEncoder for FixedSizeEncoder {
        fn encode(&self, _image: &CapturedImage) -> Result<Vec<u8>, BoxError> {
            Ok(vec![0; self.0])
        }

        fn encoded_len(&self, _image: &CapturedImage) -> Result<usize, BoxError> {
            Ok(self.0)
        }
    }

    struct FailingEncoder;

    impl ImageEncoder for FailingEncoder {
        fn encode(&self, _image: &CapturedImage) -> Result<Vec<u8>, BoxError> {
            Err("codec unavailable".into())
        }
    }

    fn validator(encoded_bytes: usize) -> QualityValidator {
        QualityValidator::new(Box::new(FixedSizeEncoder(encoded_bytes)), 1800, 500_000)
    }

    fn image(width: u32, height: u32) -> CapturedImage {
        CapturedImage::new(RgbImage::new(width, height))
    }

    #[rstest]
    #[case(1800, 1000, 500_000, true)]
    #[case(1000, 1800, 500_000, true)]
    #[case(1799, 1000, 500_000, false)]
    #[case(1800, 1000, 499_999, false)]
    #[case(2000, 1500, 600_000, true)]
    #[case(1200, 900, 300_000, false)]
    fn test_threshold_boundaries(
        #[case] width: u32,
        #[case] height: u32,
        #[case] encoded_bytes: usize,
        #[case] accepted: bool,
    ) {
        let verdict = validator(encoded_bytes).validate(&image(width, height));
        assert_eq!(verdict.is_accepted(), accepted);
    }

    #[test]
    fn test_rejection_reports_measurements() {
        let verdict = validator(300_000).validate(&image(1200, 900));
        assert_eq!(
            verdict,
            QualityVerdict::Rejected(QualityError::LowQuality {
                resolution: 1200,
                encoded_bytes: 300_000,
            })
        );
    }

    #[test]
    fn test_validation_is_idempotent() {
        let v = validator(499_999);
        let img = image(1800, 1800);
        assert_eq!(v.validate(&img), v.validate(&img));
    }

    #[test]
    fn test_encoding_failure_is_rejection() {
        let v = QualityValidator::new(Box::new(FailingEncoder), 1800, 500_000);
        let verdict = v.validate(&image(2000, 2000));
        match verdict {
            QualityVerdict::Rejected(QualityError::Encoding(msg)) => {
                assert!(msg.contains("codec unavailable"));
            }
            other => panic!("unexpected verdict: {other:?}"),
        }
    }

    #[test]
    fn test_real_encoder_rejects_small_still() {
        let v = QualityValidator::default();
        assert!(!v.validate(&image(64, 48)).is_accepted());
    }

    #[test]
    fn test_from_config_uses_configured_thresholds() {
        let config = CaptureConfig {
            min_resolution: 10,
            min_encoded_bytes: 1,
            ..CaptureConfig::default()
        };
        let v = QualityValidator::from_config(&config);
        assert_eq!(v.min_resolution(), 10);
        assert_eq!(v.min_encoded_bytes(), 1);
        assert!(v.validate(&image(16, 16)).is_accepted());
    }
}
