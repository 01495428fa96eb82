/// Minimal online logistic regression classifier, standing in for the
/// linear SGD classifier the reference implementation trains over HOG
/// features. Trained incrementally with plain stochastic gradient descent
/// plus L2 regularization (no external ML dependency available in this
/// codebase's ecosystem).
#[derive(Clone, Debug)]
pub struct OnlineLogisticRegression {
    weights: Vec<f32>,
    bias: f32,
    learning_rate: f32,
    l2: f32,
}

impl OnlineLogisticRegression {
    pub fn new(num_features: usize, learning_rate: f32, l2: f32) -> Self {
        Self {
            weights: vec![0.0; num_features],
            bias: 0.0,
            learning_rate,
            l2,
        }
    }

    #[inline]
    fn sigmoid(z: f32) -> f32 {
        1.0 / (1.0 + (-z).exp())
    }

    pub fn predict_proba(&self, features: &[f32]) -> f32 {
        debug_assert_eq!(features.len(), self.weights.len());
        let z: f32 = self
            .weights
            .iter()
            .zip(features)
            .map(|(w, x)| w * x)
            .sum::<f32>()
            + self.bias;
        Self::sigmoid(z)
    }

    /// One SGD step on a single labeled example (`label` is 0.0 or 1.0).
    pub fn partial_fit(&mut self, features: &[f32], label: f32) {
        debug_assert_eq!(features.len(), self.weights.len());
        let pred = self.predict_proba(features);
        let error = pred - label;

        for (w, x) in self.weights.iter_mut().zip(features) {
            *w -= self.learning_rate * (error * x + self.l2 * *w);
        }
        self.bias -= self.learning_rate * error;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn learns_a_linearly_separable_rule() {
        let mut model = OnlineLogisticRegression::new(1, 0.5, 0.0);
        for _ in 0..200 {
            model.partial_fit(&[1.0], 1.0);
            model.partial_fit(&[-1.0], 0.0);
        }
        assert!(model.predict_proba(&[1.0]) > 0.9);
        assert!(model.predict_proba(&[-1.0]) < 0.1);
    }

    #[test]
    fn untrained_model_predicts_near_half() {
        let model = OnlineLogisticRegression::new(3, 0.1, 0.0);
        let p = model.predict_proba(&[0.0, 0.0, 0.0]);
        assert!((p - 0.5).abs() < 1e-6);
    }
}
