//! GPU frame readback for hosts that render the view with wgpu.
//!
//! The host records a copy of its final color target into a mappable
//! buffer, submits, then resolves the pending readback into a
//! tightly packed [`Frame`]. The target must be created with
//! `COPY_SRC` usage (the drawing buffer has to be retained for capture
//! to see the last completed pass).

use std::sync::mpsc;

use crate::{CaptureError, Frame};

/// Pending GPU readback of a rendered color target.
pub struct TextureReadback {
    buffer: wgpu::Buffer,
    padded_bytes_per_row: u32,
    width: u32,
    height: u32,
    format: wgpu::TextureFormat,
}

impl TextureReadback {
    /// Resolve the readback into a tightly packed RGBA8 frame.
    pub fn into_frame(self, device: &wgpu::Device) -> Result<Frame, CaptureError> {
        let slice = self.buffer.slice(..);
        let (tx, rx) = mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |res| {
            let _ = tx.send(res);
        });

        device.poll(wgpu::Maintain::Wait);
        rx.recv()
            .map_err(|_| CaptureError::Readback("readback channel closed".into()))?
            .map_err(|err| CaptureError::Readback(err.to_string()))?;

        let mapped = slice.get_mapped_range();
        let unpadded_bytes_per_row = self.width * 4;
        let mut rgba = vec![0u8; (unpadded_bytes_per_row * self.height) as usize];

        for row in 0..self.height {
            let src_offset = (row * self.padded_bytes_per_row) as usize;
            let dst_offset = (row * unpadded_bytes_per_row) as usize;
            let src = &mapped[src_offset..src_offset + unpadded_bytes_per_row as usize];
            let dst = &mut rgba[dst_offset..dst_offset + unpadded_bytes_per_row as usize];
            dst.copy_from_slice(src);
        }

        drop(mapped);
        self.buffer.unmap();

        match self.format {
            wgpu::TextureFormat::Rgba8Unorm | wgpu::TextureFormat::Rgba8UnormSrgb => {}
            wgpu::TextureFormat::Bgra8Unorm | wgpu::TextureFormat::Bgra8UnormSrgb => {
                for pixel in rgba.chunks_exact_mut(4) {
                    pixel.swap(0, 2);
                }
            }
            other => {
                return Err(CaptureError::Readback(format!(
                    "unsupported texture format for capture: {other:?}"
                )));
            }
        }

        Ok(Frame::new(self.width, self.height, rgba))
    }

    /// Pixel dimensions of the pending frame.
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Record commands to copy `texture` into a mappable buffer.
///
/// Call [`TextureReadback::into_frame`] after submitting the encoder.
pub fn record_texture_readback(
    device: &wgpu::Device,
    encoder: &mut wgpu::CommandEncoder,
    texture: &wgpu::Texture,
    format: wgpu::TextureFormat,
    size: (u32, u32),
) -> TextureReadback {
    let (width, height) = size;
    let bytes_per_row = width * 4;
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    let padded_bytes_per_row = bytes_per_row.div_ceil(align) * align;

    let buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Capture Readback Buffer"),
        size: padded_bytes_per_row as u64 * height as u64,
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });

    encoder.copy_texture_to_buffer(
        wgpu::ImageCopyTexture {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::ImageCopyBuffer {
            buffer: &buffer,
            layout: wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(padded_bytes_per_row),
                rows_per_image: Some(height),
            },
        },
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
    );

    TextureReadback {
        buffer,
        padded_bytes_per_row,
        width,
        height,
        format,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_device() -> Option<(wgpu::Device, wgpu::Queue)> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::LowPower,
            compatible_surface: None,
            force_fallback_adapter: true,
        }))?;

        pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor::default(), None)).ok()
    }

    fn read_back_texture(
        format: wgpu::TextureFormat,
        size: (u32, u32),
        data: &[u8],
    ) -> Option<Frame> {
        let (device, queue) = test_device()?;
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Test Texture"),
            size: wgpu::Extent3d {
                width: size.0,
                height: size.1,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::COPY_SRC | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            data,
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(size.0 * 4),
                rows_per_image: Some(size.1),
            },
            wgpu::Extent3d {
                width: size.0,
                height: size.1,
                depth_or_array_layers: 1,
            },
        );

        let mut encoder =
            device.create_command_encoder(&wgpu::CommandEncoderDescriptor { label: None });
        let readback = record_texture_readback(&device, &mut encoder, &texture, format, size);
        assert_eq!(readback.size(), size);
        queue.submit(Some(encoder.finish()));

        Some(readback.into_frame(&device).expect("read back"))
    }

    #[test]
    fn readback_rgba8_matches_source() {
        let rgba = vec![1, 2, 3, 4, 5, 6, 7, 8];
        let Some(frame) = read_back_texture(wgpu::TextureFormat::Rgba8Unorm, (2, 1), &rgba) else {
            eprintln!("skipping: no wgpu adapter available");
            return;
        };
        assert_eq!(frame.rgba, rgba);
        assert_eq!((frame.width, frame.height), (2, 1));
    }

    #[test]
    fn readback_bgra8_swaps_channels() {
        let bgra = vec![3, 2, 1, 4, 7, 6, 5, 8];
        let Some(frame) = read_back_texture(wgpu::TextureFormat::Bgra8Unorm, (2, 1), &bgra) else {
            eprintln!("skipping: no wgpu adapter available");
            return;
        };
        assert_eq!(frame.rgba, vec![1, 2, 3, 4, 5, 6, 7, 8]);
    }
}
