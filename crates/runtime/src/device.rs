//! Device selection for GPU acceleration.
//!
//! Fallback order when a GPU is allowed: Metal (Apple Silicon), CUDA
//! (NVIDIA), CPU. Only backends compiled in via cargo features are tried.

use candle_core::Device;
use tracing::info;
#[cfg(any(feature = "metal", feature = "cuda"))]
use tracing::warn;

/// Pick the compute device for the model.
///
/// `use_cpu` forces the CPU even when an accelerator is available. Device
/// selection never fails; an unavailable accelerator falls back to the CPU.
pub fn select_device(use_cpu: bool) -> Device {
    if use_cpu {
        info!("Using CPU device (forced)");
        return Device::Cpu;
    }

    #[cfg(feature = "metal")]
    {
        match Device::new_metal(0) {
            Ok(device) => {
                info!("Auto-selected Metal GPU (Apple Silicon)");
                return device;
            }
            Err(e) => warn!("Metal GPU not available: {}", e),
        }
    }

    #[cfg(feature = "cuda")]
    {
        match Device::new_cuda(0) {
            Ok(device) => {
                info!("Auto-selected CUDA GPU (NVIDIA)");
                return device;
            }
            Err(e) => warn!("CUDA GPU not available: {}", e),
        }
    }

    info!("Using CPU device (no GPU available)");
    Device::Cpu
}

/// Get device name for logging/display.
pub fn device_name(device: &Device) -> &'static str {
    match device {
        Device::Cpu => "cpu",
        Device::Cuda(_) => "cuda",
        Device::Metal(_) => "metal",
    }
}
