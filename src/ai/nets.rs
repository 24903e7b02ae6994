use serde::Deserialize;

use super::features::{ACTION_FEATURE_COUNT, FEATURE_COUNT};

/// A value network over the frozen feature vector: either a flat linear
/// scorer or a small two-layer perceptron. Output is squashed to [-1, 1]
/// in both cases so the search sees one scale.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueNet {
    Linear {
        weights: Vec<f32>,
    },
    TwoLayer {
        hidden_size: usize,
        w1: Vec<f32>, // n_features x hidden, row-major by feature
        b1: Vec<f32>,
        w2: Vec<f32>, // hidden x 1
        b2: f32,
    },
}

impl ValueNet {
    pub fn evaluate(&self, features: &[f32; FEATURE_COUNT]) -> f32 {
        match self {
            ValueNet::Linear { weights } => {
                let dot: f32 = weights
                    .iter()
                    .zip(features.iter())
                    .map(|(w, f)| w * f)
                    .sum();
                dot.tanh()
            }
            ValueNet::TwoLayer {
                hidden_size,
                w1,
                b1,
                w2,
                b2,
            } => {
                let mut hidden = vec![0f32; *hidden_size];
                for (i, feature) in features.iter().enumerate() {
                    for (h, slot) in hidden.iter_mut().enumerate() {
                        *slot += feature * w1[i * hidden_size + h];
                    }
                }
                for (h, slot) in hidden.iter_mut().enumerate() {
                    *slot = (*slot + b1[h]).max(0.0); // ReLU
                }
                let out: f32 = hidden
                    .iter()
                    .zip(w2.iter())
                    .map(|(h, w)| h * w)
                    .sum::<f32>()
                    + b2;
                out.tanh()
            }
        }
    }
}

/// Linear policy over [state || action] features: logits through a
/// temperature softmax give priors over the candidate actions.
#[derive(Debug, Clone, PartialEq)]
pub struct PolicyNet {
    pub weights: Vec<f32>,
    pub bias: f32,
    pub temperature: f32,
}

impl PolicyNet {
    pub const INPUT_WIDTH: usize = FEATURE_COUNT + ACTION_FEATURE_COUNT;

    pub fn logit(
        &self,
        state_features: &[f32; FEATURE_COUNT],
        action_features: &[f32; ACTION_FEATURE_COUNT],
    ) -> f32 {
        let mut dot = self.bias;
        for (i, f) in state_features.iter().enumerate() {
            dot += self.weights[i] * f;
        }
        for (i, f) in action_features.iter().enumerate() {
            dot += self.weights[FEATURE_COUNT + i] * f;
        }
        dot
    }

    /// Softmax with the usual max-subtraction; a degenerate denominator
    /// falls back to the uniform prior.
    pub fn priors(&self, logits: &[f32]) -> Vec<f32> {
        if logits.is_empty() {
            return Vec::new();
        }
        let temperature = if self.temperature > 0.0 {
            self.temperature
        } else {
            1.0
        };
        let max = logits.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
        let exps: Vec<f32> = logits
            .iter()
            .map(|l| ((l - max) / temperature).exp())
            .collect();
        let denominator: f32 = exps.iter().sum();
        if !denominator.is_finite() || denominator <= f32::EPSILON {
            return vec![1.0 / logits.len() as f32; logits.len()];
        }
        exps.iter().map(|e| e / denominator).collect()
    }
}

/// Everything a weights file can carry.
#[derive(Debug, Clone, Default)]
pub struct LoadedWeights {
    pub value: Option<ValueNet>,
    pub policy: Option<PolicyNet>,
}

#[derive(Deserialize)]
struct NeuralSpec {
    #[serde(rename = "type")]
    kind: String,
    hidden_size: usize,
    n_features: usize,
    #[serde(rename = "W1")]
    w1: Vec<Vec<f32>>,
    b1: Vec<f32>,
    #[serde(rename = "W2")]
    w2: Vec<Vec<f32>>,
    b2: Vec<f32>,
}

#[derive(Deserialize)]
struct PolicySpec {
    policy_weights: Vec<f32>,
    #[serde(default)]
    policy_bias: f32,
    #[serde(default = "default_temperature")]
    policy_temperature: f32,
}

fn default_temperature() -> f32 {
    1.0
}

/// Pad or truncate a flat vector to the expected width, warning once on a
/// mismatch (forward compatibility: newer files may carry extra columns).
fn fit_width(mut values: Vec<f32>, expected: usize, what: &str) -> Vec<f32> {
    if values.len() != expected {
        log::warn!(
            "{what}: expected {expected} weights, found {}; padding with zeros",
            values.len()
        );
        values.resize(expected, 0.0);
    }
    values
}

/// Parse a weights file. Accepts three shapes: a flat float array (linear
/// value), an object with `"type": "neural"` (two-layer value), and either
/// may carry the `policy_*` fields alongside.
pub fn parse_weights(json: &str) -> Result<LoadedWeights, String> {
    let root: serde_json::Value =
        serde_json::from_str(json).map_err(|e| format!("weights file is not JSON: {e}"))?;

    let mut loaded = LoadedWeights::default();

    match &root {
        serde_json::Value::Array(_) => {
            let weights: Vec<f32> = serde_json::from_value(root.clone())
                .map_err(|e| format!("linear weights must be numbers: {e}"))?;
            loaded.value = Some(ValueNet::Linear {
                weights: fit_width(weights, FEATURE_COUNT, "linear value weights"),
            });
        }
        serde_json::Value::Object(map) => {
            if map.get("type").and_then(|v| v.as_str()) == Some("neural") {
                let spec: NeuralSpec = serde_json::from_value(root.clone())
                    .map_err(|e| format!("malformed neural value net: {e}"))?;
                if spec.kind != "neural" {
                    return Err(format!("unknown value net type {:?}", spec.kind));
                }
                loaded.value = Some(build_neural(spec)?);
            } else if let Some(weights) = map.get("weights") {
                let weights: Vec<f32> = serde_json::from_value(weights.clone())
                    .map_err(|e| format!("linear weights must be numbers: {e}"))?;
                loaded.value = Some(ValueNet::Linear {
                    weights: fit_width(weights, FEATURE_COUNT, "linear value weights"),
                });
            }
            if map.contains_key("policy_weights") {
                let spec: PolicySpec = serde_json::from_value(root.clone())
                    .map_err(|e| format!("malformed policy weights: {e}"))?;
                loaded.policy = Some(PolicyNet {
                    weights: fit_width(
                        spec.policy_weights,
                        PolicyNet::INPUT_WIDTH,
                        "policy weights",
                    ),
                    bias: spec.policy_bias,
                    temperature: spec.policy_temperature,
                });
            }
        }
        _ => return Err("weights file must be an array or an object".to_string()),
    }

    if loaded.value.is_none() && loaded.policy.is_none() {
        return Err("weights file carries neither value nor policy weights".to_string());
    }
    Ok(loaded)
}

fn build_neural(spec: NeuralSpec) -> Result<ValueNet, String> {
    let n = spec.n_features;
    let h = spec.hidden_size;
    if h == 0 {
        return Err("neural value net with zero hidden units".to_string());
    }
    // Flatten row-major by feature, padding missing rows/columns with
    // zeros so shape drift stays recoverable.
    let mut w1 = vec![0f32; FEATURE_COUNT * h];
    if n != FEATURE_COUNT || spec.w1.len() != n {
        log::warn!(
            "neural value net: expected {FEATURE_COUNT}x{h} W1, found {}x{h}; padding",
            spec.w1.len()
        );
    }
    for (i, row) in spec.w1.iter().enumerate().take(FEATURE_COUNT) {
        for (j, value) in row.iter().enumerate().take(h) {
            w1[i * h + j] = *value;
        }
    }
    let b1 = fit_width(spec.b1, h, "neural value b1");
    let w2_flat: Vec<f32> = spec.w2.iter().flatten().copied().collect();
    let w2 = fit_width(w2_flat, h, "neural value W2");
    let b2 = spec.b2.first().copied().unwrap_or(0.0);
    Ok(ValueNet::TwoLayer {
        hidden_size: h,
        w1,
        b1,
        w2,
        b2,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_weights_round_trip() {
        let json = serde_json::to_string(&vec![0.5f32; FEATURE_COUNT]).unwrap();
        let loaded = parse_weights(&json).unwrap();
        let net = loaded.value.unwrap();
        let mut features = [0f32; FEATURE_COUNT];
        features[0] = 1.0;
        // dot = 0.5 -> tanh(0.5)
        let value = net.evaluate(&features);
        assert!((value - 0.5f32.tanh()).abs() < 1e-6);
    }

    #[test]
    fn test_short_linear_weights_padded() {
        let json = "[1.0, 2.0]";
        let loaded = parse_weights(json).unwrap();
        let ValueNet::Linear { weights } = loaded.value.unwrap() else {
            panic!("expected linear net");
        };
        assert_eq!(weights.len(), FEATURE_COUNT);
        assert_eq!(weights[0], 1.0);
        assert_eq!(weights[2], 0.0);
    }

    #[test]
    fn test_neural_spec_parses() {
        let spec = serde_json::json!({
            "type": "neural",
            "hidden_size": 2,
            "n_features": FEATURE_COUNT,
            "W1": vec![vec![0.1f32, -0.1]; FEATURE_COUNT],
            "b1": [0.0, 0.0],
            "W2": [[1.0], [1.0]],
            "b2": [0.0],
        });
        let loaded = parse_weights(&spec.to_string()).unwrap();
        let net = loaded.value.unwrap();
        let features = [1f32; FEATURE_COUNT];
        let value = net.evaluate(&features);
        assert!(value > 0.9); // ReLU keeps the positive column only
    }

    #[test]
    fn test_policy_softmax_stability() {
        let policy = PolicyNet {
            weights: vec![0.0; PolicyNet::INPUT_WIDTH],
            bias: 0.0,
            temperature: 1.0,
        };
        let priors = policy.priors(&[1000.0, 1000.0, 1000.0]);
        let sum: f32 = priors.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
        assert!((priors[0] - 1.0 / 3.0).abs() < 1e-5);
    }

    #[test]
    fn test_policy_uniform_fallback() {
        let policy = PolicyNet {
            weights: vec![0.0; PolicyNet::INPUT_WIDTH],
            bias: 0.0,
            temperature: 1.0,
        };
        // Enormous negative spread underflows every exponent except the max;
        // the fallback never divides by zero.
        let priors = policy.priors(&[0.0, -1.0e20, -1.0e20]);
        assert_eq!(priors.len(), 3);
        let sum: f32 = priors.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_policy_fields_default() {
        let json = serde_json::json!({
            "policy_weights": [1.0, 2.0],
        });
        let loaded = parse_weights(&json.to_string()).unwrap();
        let policy = loaded.policy.unwrap();
        assert_eq!(policy.bias, 0.0);
        assert_eq!(policy.temperature, 1.0);
        assert_eq!(policy.weights.len(), PolicyNet::INPUT_WIDTH);
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(parse_weights("not json").is_err());
        assert!(parse_weights("{}").is_err());
        assert!(parse_weights("\"string\"").is_err());
    }
}
