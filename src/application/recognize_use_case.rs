// ============================================================
// Layer 2 — RecognizeUseCase
// ============================================================
// One drawing file in, one digit out:
//
//   Step 1: Load the drawing JSON          (Layer 4 - data)
//   Step 2: Normalize to the model shape   (Layer 4 - data)
//   Step 3: Optionally dump the bitmap PNG
//   Step 4: Classify                       (Layer 5 - ml)
//
// The PNG dump shows exactly what the classifier sees, which is
// the quickest way to spot a polarity or centring problem.

use anyhow::{Context, Result};
use std::{path::Path, sync::Arc};

use crate::data::{loader::load_drawing, normalizer::ImageNormalizer};
use crate::domain::bitmap::{NormalizedBitmap, Prediction};
use crate::domain::traits::DigitClassifier;

#[derive(Debug)]
pub struct RecognizeReport {
    pub prediction: Prediction,
    pub bitmap:     NormalizedBitmap,
}

pub struct RecognizeUseCase {
    classifier: Arc<dyn DigitClassifier>,
    normalizer: ImageNormalizer,
}

impl RecognizeUseCase {
    pub fn new(classifier: Arc<dyn DigitClassifier>, normalizer: ImageNormalizer) -> Self {
        Self { classifier, normalizer }
    }

    pub fn execute(&self, drawing_path: &Path, dump: Option<&Path>) -> Result<RecognizeReport> {
        let drawing = load_drawing(drawing_path)?;

        let shape  = self.classifier.input_shape();
        let bitmap = self
            .normalizer
            .normalize(&drawing, shape)
            .with_context(|| format!("Cannot normalize '{}'", drawing_path.display()))?;

        if let Some(out) = dump {
            save_png(&bitmap, out)?;
            tracing::info!("Normalized {} bitmap written to '{}'", shape, out.display());
        }

        let prediction = self
            .classifier
            .classify(&bitmap)
            .context("Classifier could not read the drawing")?;

        Ok(RecognizeReport { prediction, bitmap })
    }
}

/// Write a bitmap as an 8-bit grayscale PNG.
pub fn save_png(bitmap: &NormalizedBitmap, path: &Path) -> Result<()> {
    let shape = bitmap.shape();
    let image = image::GrayImage::from_raw(shape.width as u32, shape.height as u32, bitmap.pixels().to_vec())
        .context("Bitmap buffer does not match its shape")?;
    image
        .save(path)
        .with_context(|| format!("Cannot write PNG to '{}'", path.display()))
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::normalizer::NormalizerSettings;
    use crate::domain::bitmap::BitmapShape;
    use crate::domain::traits::ClassifierError;
    use std::fs;

    /// Reports 1 for anything with ink in the centre column.
    struct CentreColumnClassifier;

    impl DigitClassifier for CentreColumnClassifier {
        fn input_shape(&self) -> BitmapShape {
            BitmapShape::MODEL_DEFAULT
        }

        fn classify(&self, bitmap: &NormalizedBitmap) -> Result<Prediction, ClassifierError> {
            let digit = if bitmap.pixel(14, 14) > 128 { 1 } else { 0 };
            Ok(Prediction::new(digit, 1.0).unwrap())
        }
    }

    fn use_case() -> RecognizeUseCase {
        RecognizeUseCase::new(
            Arc::new(CentreColumnClassifier),
            ImageNormalizer::new(NormalizerSettings::default()),
        )
    }

    const VERTICAL_BAR: &str = r#"{
        "canvas": {"width": 200, "height": 200},
        "strokes": [{"width": 30, "points": [{"x": 100, "y": 30}, {"x": 100, "y": 170}]}]
    }"#;

    #[test]
    fn test_vertical_bar_reads_as_one_and_dumps_png() {
        let dir     = tempfile::tempdir().unwrap();
        let drawing = dir.path().join("one.json");
        let png     = dir.path().join("one.png");
        fs::write(&drawing, VERTICAL_BAR).unwrap();

        let report = use_case().execute(&drawing, Some(&png)).unwrap();
        assert_eq!(report.prediction.digit(), 1);
        assert_eq!(report.bitmap.shape(),     BitmapShape::MODEL_DEFAULT);

        let saved = image::open(&png).unwrap().to_luma8();
        assert_eq!(saved.dimensions(), (28, 28));
        assert_eq!(saved.as_raw().as_slice(), report.bitmap.pixels());
    }

    #[test]
    fn test_empty_drawing_is_reported() {
        let dir     = tempfile::tempdir().unwrap();
        let drawing = dir.path().join("blank.json");
        fs::write(&drawing, r#"{"strokes": []}"#).unwrap();

        let err = use_case().execute(&drawing, None).unwrap_err();
        assert!(format!("{err:#}").contains("blank.json"));
    }
}
