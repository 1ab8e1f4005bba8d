use candle_core::Device;
use tracing::{debug, info};

/// Prefer a compiled-in GPU backend, fall back to CPU.
pub fn select_device() -> Device {
    #[cfg(feature = "metal")]
    {
        match Device::new_metal(0) {
            Ok(dev) => { info!("Device: Metal (MPS)"); return dev; }
            Err(e) => debug!(error = %e, "Metal unavailable"),
        }
    }
    #[cfg(feature = "cuda")]
    {
        match Device::new_cuda(0) {
            Ok(dev) => { info!("Device: CUDA 0"); return dev; }
            Err(e) => debug!(error = %e, "CUDA unavailable"),
        }
    }
    debug!("Device: CPU");
    Device::Cpu
}
