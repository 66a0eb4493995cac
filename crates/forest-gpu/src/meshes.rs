//! GPU-side copies of tessellated shapes and per-batch instance buffers.

use fnv::FnvHashMap;
use forest_core::{InstanceRaw, MeshData, Shape};
use wgpu::util::DeviceExt;

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub(crate) struct Vertex {
    position: [f32; 3],
    normal: [f32; 3],
}

pub(crate) const VERTEX_ATTRIBUTES: [wgpu::VertexAttribute; 2] =
    wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3];

// model matrix columns, tint, surface params
pub(crate) const INSTANCE_ATTRIBUTES: [wgpu::VertexAttribute; 6] = wgpu::vertex_attr_array![
    2 => Float32x4,
    3 => Float32x4,
    4 => Float32x4,
    5 => Float32x4,
    6 => Float32x4,
    7 => Float32x4,
];

pub(crate) fn vertex_layouts() -> [wgpu::VertexBufferLayout<'static>; 2] {
    [
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &VERTEX_ATTRIBUTES,
        },
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<InstanceRaw>() as u64,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &INSTANCE_ATTRIBUTES,
        },
    ]
}

pub(crate) struct GpuMesh {
    pub(crate) vertex_buffer: wgpu::Buffer,
    pub(crate) index_buffer: wgpu::Buffer,
    pub(crate) index_count: u32,
}

impl GpuMesh {
    fn upload(device: &wgpu::Device, label: &str, mesh: &MeshData) -> Self {
        let vertices: Vec<Vertex> = mesh
            .positions
            .iter()
            .zip(&mesh.normals)
            .map(|(&position, &normal)| Vertex { position, normal })
            .collect();
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            vertex_buffer,
            index_buffer,
            index_count: mesh.indices.len() as u32,
        }
    }
}

/// Shapes are tessellated once and shared by every batch with the same key.
#[derive(Default)]
pub(crate) struct MeshCache {
    meshes: FnvHashMap<u64, GpuMesh>,
}

impl MeshCache {
    pub(crate) fn ensure(&mut self, device: &wgpu::Device, shape: &Shape) -> u64 {
        let key = shape.cache_key();
        if !self.meshes.contains_key(&key) {
            let data = shape.tessellate();
            log::debug!(
                "uploading mesh {:016x}: {} triangles",
                key,
                data.triangle_count()
            );
            self.meshes.insert(key, GpuMesh::upload(device, "mesh", &data));
        }
        key
    }

    pub(crate) fn get(&self, key: u64) -> Option<&GpuMesh> {
        self.meshes.get(&key)
    }

    pub(crate) fn len(&self) -> usize {
        self.meshes.len()
    }
}

pub(crate) struct InstanceBuffer {
    pub(crate) buffer: wgpu::Buffer,
    capacity: usize,
    pub(crate) count: u32,
}

/// One growable instance buffer per batch label.
#[derive(Default)]
pub(crate) struct InstanceBuffers {
    buffers: FnvHashMap<&'static str, InstanceBuffer>,
}

impl InstanceBuffers {
    pub(crate) fn write(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        label: &'static str,
        instances: &[InstanceRaw],
    ) {
        let needed = instances.len().max(1);
        let stale = self
            .buffers
            .get(label)
            .map(|b| b.capacity < needed)
            .unwrap_or(true);
        if stale {
            let capacity = needed.next_power_of_two();
            let buffer = device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(label),
                size: (capacity * std::mem::size_of::<InstanceRaw>()) as u64,
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });
            self.buffers.insert(
                label,
                InstanceBuffer {
                    buffer,
                    capacity,
                    count: 0,
                },
            );
        }
        if let Some(slot) = self.buffers.get_mut(label) {
            if !instances.is_empty() {
                queue.write_buffer(&slot.buffer, 0, bytemuck::cast_slice(instances));
            }
            slot.count = instances.len() as u32;
        }
    }

    pub(crate) fn get(&self, label: &str) -> Option<&InstanceBuffer> {
        self.buffers.get(label)
    }
}
