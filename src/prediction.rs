use serde::Serialize;

use crate::{
    model::{classify, Classifier},
    preprocess::preprocess,
};

/// Class index -> display label, in the order the model was trained with.
const LABEL_MAP: [Label; 2] = [Label::Real, Label::Fake];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Label {
    Real,
    Fake,
    Unknown,
    Error,
}

impl Label {
    pub fn from_class_index(index: usize) -> Self {
        LABEL_MAP.get(index).copied().unwrap_or(Label::Unknown)
    }
}

/// One file from a multipart upload.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PredictionResult {
    Classified {
        filename: String,
        label: Label,
        confidence: f32,
    },
    Failed {
        filename: String,
        label: Label,
        error: String,
    },
}

impl PredictionResult {
    pub fn filename(&self) -> &str {
        match self {
            PredictionResult::Classified { filename, .. }
            | PredictionResult::Failed { filename, .. } => filename,
        }
    }

    pub fn label(&self) -> Label {
        match self {
            PredictionResult::Classified { label, .. } | PredictionResult::Failed { label, .. } => {
                *label
            }
        }
    }
}

/// Runs one upload through decode, inference and labelling. Any failure is
/// reported in the result instead of being returned.
pub fn predict_file(classifier: &dyn Classifier, file: UploadedFile) -> PredictionResult {
    let outcome = preprocess(&file.bytes)
        .and_then(|image| classifier.predict(&image))
        .and_then(|probabilities| classify(&probabilities));

    match outcome {
        Ok((label, confidence)) => PredictionResult::Classified {
            filename: file.filename,
            label,
            confidence,
        },
        Err(err) => {
            log::warn!("Failed to classify {:?}: {}", file.filename, err);
            PredictionResult::Failed {
                filename: file.filename,
                label: Label::Error,
                error: err.to_string(),
            }
        }
    }
}
