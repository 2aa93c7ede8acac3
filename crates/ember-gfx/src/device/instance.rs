use anyhow::{Context, Result};

use super::ContextConfig;

/// Owns the wgpu connection that outlives any surface.
///
/// Created on the main thread before a window surface exists:
/// - creates the Instance
/// - selects an Adapter without a compatible surface
/// - creates the logical Device and Queue
///
/// Read-only for the render thread once created.
pub struct GpuInstance {
    /// wgpu instance used to create surfaces.
    instance: wgpu::Instance,

    /// Selected adapter.
    adapter: wgpu::Adapter,

    /// Logical device.
    device: wgpu::Device,

    /// Command queue.
    queue: wgpu::Queue,

    /// Configuration the instance was created with; surfaces reuse it.
    config: ContextConfig,
}

impl GpuInstance {
    /// Creates the instance, adapter and device.
    ///
    /// Adapter/device acquisition is asynchronous under wgpu.
    pub async fn new(config: ContextConfig) -> Result<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: config.backends,
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: config.power_preference,
                compatible_surface: None,
                force_fallback_adapter: config.force_fallback_adapter,
            })
            .await
            .context("failed to find a suitable GPU adapter")?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some(config.device_label.as_str()),
                required_features: config.required_features,
                required_limits: config.required_limits.clone(),
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await
            .context("failed to create wgpu device/queue")?;

        Ok(Self {
            instance,
            adapter,
            device,
            queue,
            config,
        })
    }

    /// Blocking wrapper around [`GpuInstance::new`].
    pub fn new_blocking(config: ContextConfig) -> Result<Self> {
        pollster::block_on(Self::new(config))
    }

    pub fn instance(&self) -> &wgpu::Instance {
        &self.instance
    }

    pub fn adapter(&self) -> &wgpu::Adapter {
        &self.adapter
    }

    /// Returns a reference to the logical device.
    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    /// Returns a reference to the command queue.
    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn config(&self) -> &ContextConfig {
        &self.config
    }

    /// Adapter name, vendor, backend.
    pub fn adapter_info(&self) -> wgpu::AdapterInfo {
        self.adapter.get_info()
    }

    /// Features enabled on the logical device.
    pub fn features(&self) -> wgpu::Features {
        self.device.features()
    }

    /// Limits enabled on the logical device.
    pub fn limits(&self) -> wgpu::Limits {
        self.device.limits()
    }
}
