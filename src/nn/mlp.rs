/// Multi-Layer Perceptron - generic feedforward network
///
/// Used for the value estimator: one hidden ReLU layer and a linear scalar
/// output. The layer sizes are free, so the same module also serves ad-hoc
/// regression heads in tests.
use burn::{
    nn::{Linear, LinearConfig},
    prelude::*,
    tensor::{activation::relu, backend::Backend},
};

/// Configuration for [`MLP`]
#[derive(Config, Debug)]
pub struct MLPConfig {
    /// Input dimension
    pub input_dim: usize,
    /// Hidden layer widths, e.g. `[200]` for a single 200-unit hidden layer
    pub hidden_layers: Vec<usize>,
    /// Output dimension
    pub output_dim: usize,
}

/// A stack of `Linear` layers with ReLU on every hidden layer and a linear
/// output
#[derive(Module, Debug)]
pub struct MLP<B: Backend> {
    layers: Vec<Linear<B>>,
}

impl MLPConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> MLP<B> {
        let mut layers = Vec::with_capacity(self.hidden_layers.len() + 1);
        let mut in_dim = self.input_dim;

        for &width in &self.hidden_layers {
            layers.push(LinearConfig::new(in_dim, width).init(device));
            in_dim = width;
        }
        layers.push(LinearConfig::new(in_dim, self.output_dim).init(device));

        MLP { layers }
    }
}

impl<B: Backend> MLP<B> {
    /// Forward pass; the last dimension is the feature dimension
    pub fn forward<const D: usize>(&self, input: Tensor<B, D>) -> Tensor<B, D> {
        let mut x = input;
        let (last, hidden) = self
            .layers
            .split_last()
            .expect("MLP always has at least one layer");

        for layer in hidden {
            x = relu(layer.forward(x));
        }
        last.forward(x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::ndarray::{NdArray, NdArrayDevice};

    #[test]
    fn value_head_shape() {
        let device = NdArrayDevice::default();
        // The critic architecture: state -> 200 ReLU units -> scalar
        let mlp = MLPConfig::new(3, vec![200], 1).init::<NdArray>(&device);

        let states = Tensor::<NdArray, 2>::random(
            [8, 3],
            burn::tensor::Distribution::Uniform(-1.0, 1.0),
            &device,
        );
        let values = mlp.forward(states);
        assert_eq!(values.shape().dims, [8, 1]);
    }

    #[test]
    fn no_hidden_layers_is_linear() {
        let device = NdArrayDevice::default();
        let mlp = MLPConfig::new(4, vec![], 2).init::<NdArray>(&device);

        let input = Tensor::<NdArray, 2>::random(
            [1, 4],
            burn::tensor::Distribution::Default,
            &device,
        );
        assert_eq!(mlp.forward(input).shape().dims, [1, 2]);
    }

    #[test]
    fn forward_1d() {
        let device = NdArrayDevice::default();
        let mlp = MLPConfig::new(4, vec![16], 2).init::<NdArray>(&device);

        let input = Tensor::<NdArray, 1>::random(
            [4],
            burn::tensor::Distribution::Default,
            &device,
        );
        assert_eq!(mlp.forward(input).shape().dims, [2]);
    }
}
