use crate::config;
use crate::controller::{Controller, Observation};
use crate::error::ControllerError;
use crate::genome::{Genome, INPUTS};

/// Decoded feed-forward network: inputs -> tanh hidden layer -> tanh output.
#[derive(Clone, Debug, PartialEq)]
pub struct Network {
    pub hidden: usize,
    /// Row-major [hidden][input], or [1][input] when there is no hidden layer.
    pub input_weights: Vec<f32>,
    pub hidden_biases: Vec<f32>,
    pub output_weights: Vec<f32>,
    pub output_bias: f32,
    /// Multiplied into every input so pixel-scale observations stay in tanh's useful range.
    pub input_scale: f32,
}

impl Network {
    pub fn from_genome(genome: &Genome, input_scale: f32) -> Self {
        let rows = genome.hidden.max(1);
        let mut input_weights = vec![0.0; rows * INPUTS];
        for h in 0..rows {
            for i in 0..INPUTS {
                input_weights[h * INPUTS + i] = genome.input_weight(h, i);
            }
        }

        let (hidden_biases, output_weights) = if genome.hidden == 0 {
            (Vec::new(), Vec::new())
        } else {
            (
                (0..genome.hidden).map(|h| genome.hidden_bias(h)).collect(),
                (0..genome.hidden).map(|h| genome.output_weight(h)).collect(),
            )
        };

        Self {
            hidden: genome.hidden,
            input_weights,
            hidden_biases,
            output_weights,
            output_bias: genome.output_bias(),
            input_scale,
        }
    }

    pub fn activate(&self, inputs: [f32; INPUTS]) -> f32 {
        let scaled = inputs.map(|v| v * self.input_scale);

        if self.hidden == 0 {
            let sum: f32 = (0..INPUTS)
                .map(|i| self.input_weights[i] * scaled[i])
                .sum();
            return (sum + self.output_bias).tanh();
        }

        let mut out = self.output_bias;
        for h in 0..self.hidden {
            let row = h * INPUTS;
            let mut sum = self.hidden_biases[h];
            for i in 0..INPUTS {
                sum += self.input_weights[row + i] * scaled[i];
            }
            out += self.output_weights[h] * sum.tanh();
        }
        out.tanh()
    }
}

/// Controller backed by an evolved network. Jumps when the output exceeds the threshold.
#[derive(Clone, Debug)]
pub struct NeuralController {
    pub network: Network,
    pub threshold: f32,
}

impl NeuralController {
    pub fn new(network: Network) -> Self {
        Self {
            network,
            threshold: config::JUMP_THRESHOLD,
        }
    }
}

impl Controller for NeuralController {
    fn decide(&mut self, obs: &Observation) -> Result<bool, ControllerError> {
        let output = self.network.activate(obs.as_inputs());
        if !output.is_finite() {
            return Err(ControllerError(format!(
                "network produced {output} for {obs:?}"
            )));
        }
        Ok(output > self.threshold)
    }
}
