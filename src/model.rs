use std::{fs, path::Path};

use tensorflow::{Graph, ImportGraphDefOptions, Session, SessionOptions, SessionRunArgs, Tensor};

use crate::{
    error::{AppError, ClassifyError},
    prediction::Label,
    preprocess::PreprocessedImage,
};

/// A loaded binary image classifier. Implementations are read-only after
/// construction, so one instance serves every request without locking.
pub trait Classifier: Send + Sync {
    /// Probability vector for the single image in the batch.
    fn predict(&self, image: &PreprocessedImage) -> Result<Vec<f32>, ClassifyError>;
}

/// Frozen TensorFlow graph exported from the trained Keras model.
pub struct TfModel {
    session: Session,
    graph: Graph,
    input_op: String,
    output_op: String,
}

impl TfModel {
    pub fn load(path: &Path, input_op: &str, output_op: &str) -> Result<Self, AppError> {
        let model_bytes = fs::read(path)?;

        let mut graph = Graph::new();
        graph.import_graph_def(&model_bytes, &ImportGraphDefOptions::new())?;

        // Fail at startup rather than on the first request.
        for name in [input_op, output_op] {
            if graph
                .operation_by_name(name)
                .map_err(tensorflow::Status::from)?
                .is_none()
            {
                return Err(AppError::MissingOperation(name.to_string()));
            }
        }

        let session = Session::new(&SessionOptions::new(), &graph)?;

        Ok(TfModel {
            session,
            graph,
            input_op: input_op.to_string(),
            output_op: output_op.to_string(),
        })
    }
}

impl Classifier for TfModel {
    fn predict(&self, image: &PreprocessedImage) -> Result<Vec<f32>, ClassifyError> {
        let input_tensor = Tensor::new(&image.shape()).with_values(image.pixels())?;

        let input_operation = self.graph.operation_by_name_required(&self.input_op)?;
        let output_operation = self.graph.operation_by_name_required(&self.output_op)?;

        let mut args = SessionRunArgs::new();
        args.add_feed(&input_operation, 0, &input_tensor);
        let output_token = args.request_fetch(&output_operation, 0);
        self.session.run(&mut args)?;

        let output_tensor: Tensor<f32> = args.fetch(output_token)?;
        // Output is [batch, classes]; keep the row for our single image.
        let dims = output_tensor.dims();
        let row_len = match dims.len() {
            0 | 1 => output_tensor.len(),
            _ => dims[1..].iter().product::<u64>() as usize,
        };
        Ok(output_tensor.iter().take(row_len).copied().collect())
    }
}

/// Picks the most probable class and reports its probability as confidence.
/// Ties resolve to the lowest index.
pub fn classify(probabilities: &[f32]) -> Result<(Label, f32), ClassifyError> {
    let (index, confidence) = probabilities
        .iter()
        .copied()
        .enumerate()
        .fold(None, |best: Option<(usize, f32)>, (i, p)| match best {
            Some((_, top)) if p <= top => best,
            _ => Some((i, p)),
        })
        .ok_or(ClassifyError::EmptyPrediction)?;

    Ok((Label::from_class_index(index), confidence))
}
