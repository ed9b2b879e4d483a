//! Vertex buffers owned per mesh, with a scoped bind/unbind contract.

use tracing::debug;

use crate::device::{BufferHandle, GpuDevice, GpuError, Topology};
use crate::tessellator::Mesh;
use crate::vertex::Vertex;

/// A mesh that lives on the device. Uploaded once, never mutated; a new mesh needs a new
/// `GpuMesh`.
#[derive(Debug)]
pub struct GpuMesh {
    buffer: BufferHandle,
    topology: Topology,
    vertex_count: u32,
}

impl GpuMesh {
    /// Copies the vertices of `mesh` to the device.
    pub fn upload<V: Vertex>(device: &mut dyn GpuDevice, mesh: &Mesh<V>) -> Result<Self, GpuError> {
        let buffer = device.create_vertex_buffer(
            Some("mesh_vertices"),
            bytemuck::cast_slice(&mesh.vertices),
        )?;
        debug!(
            %buffer,
            vertices = mesh.vertex_count(),
            topology = ?mesh.topology,
            "uploaded mesh"
        );
        Ok(Self {
            buffer,
            topology: mesh.topology,
            vertex_count: mesh.vertex_count() as u32,
        })
    }

    pub fn topology(&self) -> Topology {
        self.topology
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    pub fn buffer(&self) -> BufferHandle {
        self.buffer
    }

    /// Binds the vertex buffer. The returned guard unbinds it when dropped, so bound state
    /// never leaks past the draw, whether it succeeded or not.
    pub fn bind<'a>(
        &'a self,
        device: &'a mut dyn GpuDevice,
    ) -> Result<BoundMesh<'a>, GpuError> {
        device.bind_vertex_buffer(self.buffer)?;
        Ok(BoundMesh { mesh: self, device })
    }

    pub fn release(self, device: &mut dyn GpuDevice) {
        device.destroy_buffer(self.buffer);
    }
}

/// A [`GpuMesh`] whose buffer is currently bound.
pub struct BoundMesh<'a> {
    mesh: &'a GpuMesh,
    device: &'a mut dyn GpuDevice,
}

impl BoundMesh<'_> {
    /// Issues exactly one draw call over the whole mesh.
    pub fn draw(&mut self) -> Result<(), GpuError> {
        self.device
            .draw(self.mesh.topology, 0, self.mesh.vertex_count)
    }
}

impl Drop for BoundMesh<'_> {
    fn drop(&mut self) {
        self.device.unbind_vertex_buffer();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{DeviceStats, PixelRect, ProgramDescriptor, ProgramHandle, TextureHandle,
        UniformValue};
    use crate::vertex::PrimitiveVertex;

    /// Records the calls a mesh makes.
    #[derive(Default)]
    struct RecordingDevice {
        calls: Vec<String>,
        fail_draws: bool,
    }

    impl GpuDevice for RecordingDevice {
        fn viewport(&self) -> (u32, u32) {
            (1, 1)
        }
        fn create_vertex_buffer(
            &mut self,
            _label: Option<&str>,
            contents: &[u8],
        ) -> Result<BufferHandle, GpuError> {
            self.calls.push(format!("create {}", contents.len()));
            Ok(BufferHandle(7))
        }
        fn destroy_buffer(&mut self, buffer: BufferHandle) {
            self.calls.push(format!("destroy {buffer}"));
        }
        fn create_program(&mut self, _: &ProgramDescriptor<'_>) -> Result<ProgramHandle, GpuError> {
            Ok(ProgramHandle(1))
        }
        fn destroy_program(&mut self, _: ProgramHandle) {}
        fn use_program(&mut self, _: ProgramHandle) -> Result<(), GpuError> {
            Ok(())
        }
        fn set_uniform(&mut self, _: ProgramHandle, _: &str, _: UniformValue) -> Result<(), GpuError> {
            Ok(())
        }
        fn create_texture(&mut self, _: u32, _: u32, _: &[u8]) -> Result<TextureHandle, GpuError> {
            Ok(TextureHandle(1))
        }
        fn destroy_texture(&mut self, _: TextureHandle) {}
        fn bind_texture(&mut self, _: Option<TextureHandle>) -> Result<(), GpuError> {
            Ok(())
        }
        fn bind_vertex_buffer(&mut self, buffer: BufferHandle) -> Result<(), GpuError> {
            self.calls.push(format!("bind {buffer}"));
            Ok(())
        }
        fn unbind_vertex_buffer(&mut self) {
            self.calls.push("unbind".into());
        }
        fn begin_frame(&mut self) -> Result<(), GpuError> {
            Ok(())
        }
        fn clear(&mut self, _: [f32; 4], _: Option<PixelRect>) -> Result<(), GpuError> {
            Ok(())
        }
        fn draw(&mut self, topology: Topology, first: u32, count: u32) -> Result<(), GpuError> {
            self.calls.push(format!("draw {topology:?} {first} {count}"));
            if self.fail_draws {
                return Err(GpuError::NoProgram);
            }
            Ok(())
        }
        fn end_frame(&mut self) -> Result<(), GpuError> {
            Ok(())
        }
        fn read_pixels(&mut self) -> Result<Vec<u8>, GpuError> {
            Ok(Vec::new())
        }
        fn stats(&self) -> DeviceStats {
            DeviceStats::default()
        }
    }

    fn strip() -> Mesh {
        Mesh::new(
            vec![
                PrimitiveVertex::new(0.0, 0.0),
                PrimitiveVertex::new(1.0, 0.0),
                PrimitiveVertex::new(0.0, 1.0),
                PrimitiveVertex::new(1.0, 1.0),
            ],
            Topology::TriangleStrip,
        )
    }

    #[test]
    fn draw_is_a_single_call_between_bind_and_unbind() {
        let mut device = RecordingDevice::default();
        let mesh = GpuMesh::upload(&mut device, &strip()).unwrap();
        mesh.bind(&mut device).unwrap().draw().unwrap();
        mesh.release(&mut device);
        assert_eq!(
            device.calls,
            vec![
                "create 32",
                "bind 7",
                "draw TriangleStrip 0 4",
                "unbind",
                "destroy 7"
            ]
        );
    }

    #[test]
    fn failed_draw_still_unbinds() {
        let mut device = RecordingDevice {
            fail_draws: true,
            ..Default::default()
        };
        let mesh = GpuMesh::upload(&mut device, &strip()).unwrap();
        let result = mesh.bind(&mut device).and_then(|mut bound| bound.draw());
        assert!(result.is_err());
        assert_eq!(device.calls.last().map(String::as_str), Some("unbind"));
    }
}
