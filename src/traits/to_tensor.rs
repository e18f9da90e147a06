use burn::{
    prelude::*,
    tensor::{backend::Backend, BasicOps, Element, TensorData},
};

/// A trait for converting batches of items to tensors
///
/// Implemented for `Vec<T>` where `T` is a state or action representation:
/// fixed-size arrays (the usual case for hand-rolled environments) and
/// runtime-sized `Vec<f32>` rows (featurized states).
pub trait ToTensor<B: Backend, const D: usize, K: BasicOps<B>> {
    fn to_tensor(self, device: &B::Device) -> Tensor<B, D, K>;
}

impl<B, E, K> ToTensor<B, 1, K> for Vec<E>
where
    B: Backend,
    E: Element,
    K: BasicOps<B, Elem = E>,
{
    #[inline]
    fn to_tensor(self, device: &B::Device) -> Tensor<B, 1, K> {
        let len = self.len();
        Tensor::from_data(TensorData::new(self, [len]), device)
    }
}

impl<B, E, K, const A: usize> ToTensor<B, 2, K> for Vec<[E; A]>
where
    B: Backend,
    E: Element,
    K: BasicOps<B, Elem = E>,
{
    #[inline]
    fn to_tensor(self, device: &B::Device) -> Tensor<B, 2, K> {
        let rows = self.len();
        let mut flat = Vec::with_capacity(rows * A);
        for row in &self {
            flat.extend_from_slice(row);
        }
        Tensor::from_data(TensorData::new(flat, [rows, A]), device)
    }
}

/// Runtime-width rows, e.g. featurized states. Every row must have the same
/// length; an empty batch is not convertible.
impl<B, E, K> ToTensor<B, 2, K> for Vec<Vec<E>>
where
    B: Backend,
    E: Element,
    K: BasicOps<B, Elem = E>,
{
    fn to_tensor(self, device: &B::Device) -> Tensor<B, 2, K> {
        let rows = self.len();
        let width = self
            .first()
            .map(Vec::len)
            .expect("cannot build a tensor from an empty batch");
        let mut flat = Vec::with_capacity(rows * width);
        for row in self {
            debug_assert_eq!(row.len(), width, "ragged batch");
            flat.extend(row);
        }
        Tensor::from_data(TensorData::new(flat, [rows, width]), device)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::ndarray::{NdArray, NdArrayDevice};

    #[test]
    fn vec_f32_to_tensor_1d() {
        let device = NdArrayDevice::default();
        let tensor: Tensor<NdArray, 1> = vec![1.0_f32, 2.0, 3.0].to_tensor(&device);

        assert_eq!(tensor.shape().dims, [3]);
        assert_eq!(
            tensor.to_data().as_slice::<f32>().unwrap(),
            &[1.0, 2.0, 3.0]
        );
    }

    #[test]
    fn vec_array_to_tensor_2d() {
        let device = NdArrayDevice::default();
        let states = vec![[1.0_f32, 2.0, 3.0], [4.0, 5.0, 6.0]];
        let tensor: Tensor<NdArray, 2> = states.to_tensor(&device);

        assert_eq!(tensor.shape().dims, [2, 3]);
        assert_eq!(
            tensor.to_data().as_slice::<f32>().unwrap(),
            &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]
        );
    }

    #[test]
    fn vec_vec_to_tensor_2d() {
        let device = NdArrayDevice::default();
        let states = vec![vec![1.0_f32, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]];
        let tensor: Tensor<NdArray, 2> = states.to_tensor(&device);

        assert_eq!(tensor.shape().dims, [3, 2]);
        assert_eq!(
            tensor.to_data().as_slice::<f32>().unwrap(),
            &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]
        );
    }

    #[test]
    fn single_row_batch() {
        let device = NdArrayDevice::default();
        let states = vec![[0.5_f32; 4]];
        let tensor: Tensor<NdArray, 2> = states.to_tensor(&device);
        assert_eq!(tensor.shape().dims, [1, 4]);
    }
}
