//! Utilities.
use anyhow::{anyhow, Result};
use candle_core::Tensor;
use candle_nn::VarMap;
use pgrl_core::record::{Record, RecordValue};

/// Interface for handling input dimensions.
pub trait InDim {
    /// Returns the input dimension.
    fn get_in_dim(&self) -> usize;

    /// Sets the input dimension.
    fn set_in_dim(&mut self, v: usize);
}

/// Interface for handling output dimensions.
pub trait OutDim {
    /// Returns the output dimension.
    fn get_out_dim(&self) -> usize;

    /// Sets the output dimension.
    fn set_out_dim(&mut self, v: usize);
}

/// Returns the standard deviation of a tensor.
pub fn std(t: &Tensor) -> Result<f32> {
    let var = t
        .broadcast_sub(&t.mean_all()?)?
        .powf(2f64)?
        .mean_all()?
        .to_scalar::<f32>()?;
    Ok(var.sqrt())
}

/// Returns the mean and standard deviation of every variable in the [`VarMap`].
pub fn param_stats(varmap: &VarMap) -> Result<Record> {
    let mut record = Record::empty();
    let data = varmap
        .data()
        .lock()
        .map_err(|e| anyhow!("failed to lock the parameters: {}", e))?;

    for (k, v) in data.iter() {
        let m: f32 = v.mean_all()?.to_scalar()?;
        record.insert(format!("{}_mean", &k), RecordValue::Scalar(m));
        record.insert(format!("{}_std", &k), RecordValue::Scalar(std(v.as_tensor())?));
    }

    Ok(record)
}

/// Copies all parameters into a flat vector, ordered by variable name.
pub fn flat_params(varmap: &VarMap) -> Result<Vec<f32>> {
    let data = varmap
        .data()
        .lock()
        .map_err(|e| anyhow!("failed to lock the parameters: {}", e))?;
    let mut names = data.keys().collect::<Vec<_>>();
    names.sort();

    let mut params = vec![];
    for name in names {
        if let Some(var) = data.get(name) {
            params.extend(var.as_tensor().flatten_all()?.to_vec1::<f32>()?);
        }
    }

    Ok(params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::{DType, Device};
    use candle_nn::Init;

    #[test]
    fn test_std() -> Result<()> {
        let t = Tensor::from_slice(&[1.0f32, 3.0, 1.0, 3.0], (2, 2), &Device::Cpu)?;
        assert!((std(&t)? - 1.0).abs() < 1e-6);
        Ok(())
    }

    #[test]
    fn test_param_stats() -> Result<()> {
        let varmap = VarMap::new();
        varmap.get((2,), "w", Init::Const(2.0), DType::F32, &Device::Cpu)?;
        let record = param_stats(&varmap)?;
        assert_eq!(record.get_scalar("w_mean")?, 2.0);
        assert_eq!(record.get_scalar("w_std")?, 0.0);
        assert_eq!(flat_params(&varmap)?, vec![2.0, 2.0]);
        Ok(())
    }
}
