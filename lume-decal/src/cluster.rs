use log::info;
use lume_core::device::*;
use lume_core::{Device, LumeResult};

use crate::partition::IndexPartition;
use crate::shaders;
use crate::{CLUSTER_WORDS_PER_CELL, NUM_Z_TILES, TILE_SIZE};

/// Dimensions of the screen/depth cluster grid for one render-target size.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClusterGridLayout {
    pub width: u32,
    pub height: u32,
    pub num_x_tiles: u32,
    pub num_y_tiles: u32,
    pub num_z_tiles: u32,
    pub words_per_cell: u32,
}

impl ClusterGridLayout {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            num_x_tiles: width.div_ceil(TILE_SIZE).max(1),
            num_y_tiles: height.div_ceil(TILE_SIZE).max(1),
            num_z_tiles: NUM_Z_TILES,
            words_per_cell: CLUSTER_WORDS_PER_CELL,
        }
    }

    pub fn cell_count(&self) -> u32 {
        self.num_x_tiles * self.num_y_tiles * self.num_z_tiles
    }

    pub fn word_count(&self) -> u32 {
        self.cell_count() * self.words_per_cell
    }

    pub fn size_in_bytes(&self) -> u64 {
        self.word_count() as u64 * 4
    }

    pub fn cell_index(&self, x: u32, y: u32, z: u32) -> u32 {
        (z * self.num_y_tiles + y) * self.num_x_tiles + x
    }

    /// Word index and mask holding bit `position` of a cell.
    pub fn bit_location(&self, cell: u32, position: u32) -> (usize, u32) {
        let word = cell * self.words_per_cell + position / 32;
        (word as usize, 1 << (position % 32))
    }

    pub fn tile_of_pixel(&self, px: u32, py: u32) -> (u32, u32) {
        ((px / TILE_SIZE).min(self.num_x_tiles - 1), (py / TILE_SIZE).min(self.num_y_tiles - 1))
    }
}

/// The three culling subpasses of a cluster build, in execution order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClusterPass {
    /// Boxes around the camera: only their back faces are on screen.
    StraddlingBackFaces,
    OutsideBackFaces,
    OutsideFrontFaces,
}

impl ClusterPass {
    pub const ALL: [ClusterPass; 3] = [
        ClusterPass::StraddlingBackFaces,
        ClusterPass::OutsideBackFaces,
        ClusterPass::OutsideFrontFaces,
    ];

    pub fn subpass(self) -> u32 {
        self as u32
    }

    pub fn cull_mode(self) -> CullMode {
        match self {
            ClusterPass::StraddlingBackFaces | ClusterPass::OutsideBackFaces => CullMode::Front,
            ClusterPass::OutsideFrontFaces => CullMode::Back,
        }
    }

    /// `(first_instance, instance_count)` into the partition.
    pub fn instance_range(self, partition: &IndexPartition) -> (u32, u32) {
        let active = partition.active_count() as u32;
        let straddling = partition.num_straddling as u32;
        match self {
            ClusterPass::StraddlingBackFaces => (0, straddling),
            ClusterPass::OutsideBackFaces | ClusterPass::OutsideFrontFaces => (straddling, active - straddling),
        }
    }
}

/// Attachment-less pass with one subpass per [`ClusterPass`]. Each subpass sees
/// the bitmask writes of the previous one.
pub fn cluster_render_pass_descriptor() -> RenderPassDescriptor {
    let fragment_rw = Access::SHADER_READ | Access::SHADER_WRITE;
    let mut dependencies = vec![SubpassDependency {
        src_subpass: SubpassIndex::External,
        dst_subpass: SubpassIndex::Index(0),
        src_stage: PipelineStage::TRANSFER,
        dst_stage: PipelineStage::FRAGMENT_SHADER,
        src_access: Access::TRANSFER_WRITE,
        dst_access: fragment_rw,
        by_region: false,
    }];
    for pass in 1..ClusterPass::ALL.len() as u32 {
        dependencies.push(SubpassDependency {
            src_subpass: SubpassIndex::Index(pass - 1),
            dst_subpass: SubpassIndex::Index(pass),
            src_stage: PipelineStage::FRAGMENT_SHADER,
            dst_stage: PipelineStage::FRAGMENT_SHADER,
            src_access: Access::SHADER_WRITE,
            dst_access: fragment_rw,
            by_region: true,
        });
    }

    RenderPassDescriptor {
        attachments: Vec::new(),
        subpasses: vec![SubpassDescriptor::default(); ClusterPass::ALL.len()],
        dependencies,
    }
}

/// Corners of the `[-1, 1]^3` proxy box; bit 0 is x, bit 1 is y, bit 2 is z.
const UNIT_BOX_VERTICES: [[f32; 3]; 8] = [
    [-1.0, -1.0, -1.0],
    [1.0, -1.0, -1.0],
    [-1.0, 1.0, -1.0],
    [1.0, 1.0, -1.0],
    [-1.0, -1.0, 1.0],
    [1.0, -1.0, 1.0],
    [-1.0, 1.0, 1.0],
    [1.0, 1.0, 1.0],
];

/// Counter-clockwise when seen from outside.
const UNIT_BOX_INDICES: [u16; 36] = [
    4, 5, 7, 4, 7, 6, // +z
    0, 2, 3, 0, 3, 1, // -z
    5, 1, 3, 5, 3, 7, // +x
    0, 4, 6, 0, 6, 2, // -x
    6, 7, 3, 6, 3, 2, // +y
    0, 1, 5, 0, 5, 4, // -y
];

/// Rasterizes decal proxy boxes into the cluster bitmask buffer.
pub struct ClusterBuilder<D: Device> {
    device: D,
    layout: ClusterGridLayout,
    render_pass: D::RenderPass,
    framebuffer: D::Framebuffer,
    bind_group_layout: D::BindGroupLayout,
    _pipeline_layout: D::PipelineLayout,
    pipelines: Vec<D::GraphicsPipeline>,
    vertex_buffer: D::Buffer,
    index_buffer: D::Buffer,
    cluster_buffer: D::Buffer,
}

impl<D: Device> ClusterBuilder<D> {
    pub fn new(device: &D, width: u32, height: u32) -> LumeResult<Self> {
        let layout = ClusterGridLayout::new(width, height);

        let vertex_shader = device.create_shader_module(&shaders::compile(shaders::CLUSTER_VERTEX)?)?;
        let fragment_shader = device.create_shader_module(&shaders::compile(shaders::CLUSTER_FRAGMENT)?)?;

        let bind_group_layout = device.create_bind_group_layout(BindGroupLayoutDescriptor {
            entries: vec![
                BindGroupLayoutEntry { binding: 0, visibility: ShaderStage::VERTEX | ShaderStage::FRAGMENT, ty: BindingType::UniformBuffer },
                BindGroupLayoutEntry { binding: 1, visibility: ShaderStage::VERTEX, ty: BindingType::StorageBuffer },
                BindGroupLayoutEntry { binding: 2, visibility: ShaderStage::VERTEX, ty: BindingType::StorageBuffer },
                BindGroupLayoutEntry { binding: 3, visibility: ShaderStage::VERTEX, ty: BindingType::StorageBuffer },
                BindGroupLayoutEntry { binding: 4, visibility: ShaderStage::FRAGMENT, ty: BindingType::StorageBuffer },
            ],
        })?;
        let pipeline_layout = device.create_pipeline_layout(PipelineLayoutDescriptor {
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        })?;

        let render_pass = device.create_render_pass(cluster_render_pass_descriptor())?;
        let framebuffer = device.create_framebuffer(FramebufferDescriptor {
            render_pass: &render_pass,
            attachments: &[],
            width: layout.width,
            height: layout.height,
        })?;

        let pipelines = ClusterPass::ALL
            .iter()
            .map(|pass| {
                device.create_graphics_pipeline(GraphicsPipelineDescriptor {
                    vertex_shader: &vertex_shader,
                    fragment_shader: &fragment_shader,
                    render_pass: &render_pass,
                    subpass: pass.subpass(),
                    layout: &pipeline_layout,
                    primitive: PrimitiveState {
                        topology: PrimitiveTopology::TriangleList,
                        cull_mode: pass.cull_mode(),
                        front_face: FrontFace::CounterClockwise,
                    },
                    vertex_layout: Some(VertexLayout {
                        array_stride: 12,
                        attributes: vec![VertexAttribute { location: 0, format: VertexFormat::Float32x3, offset: 0 }],
                    }),
                    depth_stencil: None,
                    color_target_count: 0,
                })
            })
            .collect::<LumeResult<Vec<_>>>()?;

        let vertex_buffer = device.create_buffer(BufferDescriptor {
            size: std::mem::size_of_val(&UNIT_BOX_VERTICES) as u64,
            usage: BufferUsage::VERTEX,
            location: MemoryLocation::CpuToGpu,
        })?;
        vertex_buffer.write_data(0, bytemuck::cast_slice(&UNIT_BOX_VERTICES))?;

        let index_buffer = device.create_buffer(BufferDescriptor {
            size: std::mem::size_of_val(&UNIT_BOX_INDICES) as u64,
            usage: BufferUsage::INDEX,
            location: MemoryLocation::CpuToGpu,
        })?;
        index_buffer.write_data(0, bytemuck::cast_slice(&UNIT_BOX_INDICES))?;

        let cluster_buffer = Self::create_cluster_buffer(device, &layout)?;

        info!(
            "Cluster builder ready: {}x{}x{} cells, {} bytes",
            layout.num_x_tiles,
            layout.num_y_tiles,
            layout.num_z_tiles,
            layout.size_in_bytes()
        );

        Ok(Self {
            device: device.clone(),
            layout,
            render_pass,
            framebuffer,
            bind_group_layout,
            _pipeline_layout: pipeline_layout,
            pipelines,
            vertex_buffer,
            index_buffer,
            cluster_buffer,
        })
    }

    fn create_cluster_buffer(device: &D, layout: &ClusterGridLayout) -> LumeResult<D::Buffer> {
        device.create_buffer(BufferDescriptor {
            size: layout.size_in_bytes(),
            usage: BufferUsage::STORAGE | BufferUsage::COPY_DST,
            location: MemoryLocation::GpuOnly,
        })
    }

    /// Recreates the size-dependent framebuffer and bitmask buffer. Bind groups
    /// that reference the old buffer have to be rebuilt by the caller.
    pub fn resize(&mut self, width: u32, height: u32) -> LumeResult<()> {
        let layout = ClusterGridLayout::new(width, height);
        self.framebuffer = self.device.create_framebuffer(FramebufferDescriptor {
            render_pass: &self.render_pass,
            attachments: &[],
            width: layout.width,
            height: layout.height,
        })?;
        if layout.word_count() != self.layout.word_count() {
            self.cluster_buffer = Self::create_cluster_buffer(&self.device, &layout)?;
        }
        self.layout = layout;
        info!("Cluster grid resized to {}x{}x{}", layout.num_x_tiles, layout.num_y_tiles, layout.num_z_tiles);
        Ok(())
    }

    pub fn grid_layout(&self) -> &ClusterGridLayout {
        &self.layout
    }

    pub fn cluster_buffer(&self) -> &D::Buffer {
        &self.cluster_buffer
    }

    pub fn create_bind_group(
        &self,
        camera: BindingResource<'_, D>,
        decals: BindingResource<'_, D>,
        index_list: BindingResource<'_, D>,
        z_bounds: BindingResource<'_, D>,
    ) -> LumeResult<D::BindGroup> {
        self.device.create_bind_group(BindGroupDescriptor {
            layout: &self.bind_group_layout,
            entries: vec![
                BindGroupEntry { binding: 0, resource: camera },
                BindGroupEntry { binding: 1, resource: decals },
                BindGroupEntry { binding: 2, resource: index_list },
                BindGroupEntry { binding: 3, resource: z_bounds },
                BindGroupEntry { binding: 4, resource: BindingResource::Buffer(&self.cluster_buffer) },
            ],
        })
    }

    /// Clears the bitmask, then runs the three culling subpasses over `partition`.
    /// Ends with the bitmask visible to fragment and compute reads.
    pub fn record(&self, cmd: &mut D::CommandBuffer, bind_group: &D::BindGroup, partition: &IndexPartition) {
        // Previous frame's shading may still be reading the shared bitmask.
        cmd.buffer_barrier(
            &self.cluster_buffer,
            BufferBarrier::whole(
                PipelineStage::FRAGMENT_SHADER | PipelineStage::COMPUTE_SHADER,
                Access::SHADER_READ | Access::SHADER_WRITE,
                PipelineStage::TRANSFER,
                Access::TRANSFER_WRITE,
            ),
        );
        cmd.fill_buffer(&self.cluster_buffer, 0, self.layout.size_in_bytes(), 0);
        cmd.buffer_barrier(
            &self.cluster_buffer,
            BufferBarrier::whole(
                PipelineStage::TRANSFER,
                Access::TRANSFER_WRITE,
                PipelineStage::FRAGMENT_SHADER,
                Access::SHADER_READ | Access::SHADER_WRITE,
            ),
        );

        cmd.begin_render_pass(&self.render_pass, &self.framebuffer, &[]);
        cmd.set_viewport(0.0, 0.0, self.layout.width as f32, self.layout.height as f32);
        cmd.set_scissor(0, 0, self.layout.width, self.layout.height);
        cmd.bind_vertex_buffer(&self.vertex_buffer);
        cmd.bind_index_buffer(&self.index_buffer, IndexFormat::Uint16);

        for (pass, pipeline) in ClusterPass::ALL.iter().zip(&self.pipelines) {
            if pass.subpass() > 0 {
                cmd.next_subpass();
            }
            let (first_instance, instance_count) = pass.instance_range(partition);
            if instance_count == 0 {
                continue;
            }
            cmd.bind_graphics_pipeline(pipeline);
            cmd.bind_bind_group(0, bind_group);
            cmd.draw_indexed(UNIT_BOX_INDICES.len() as u32, instance_count, 0, 0, first_instance);
        }
        cmd.end_render_pass();

        cmd.buffer_barrier(
            &self.cluster_buffer,
            BufferBarrier::whole(
                PipelineStage::FRAGMENT_SHADER,
                Access::SHADER_WRITE,
                PipelineStage::FRAGMENT_SHADER | PipelineStage::COMPUTE_SHADER,
                Access::SHADER_READ,
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use glam::{Vec2, Vec3};

    use super::*;
    use crate::camera::CameraState;
    use crate::obb::Obb;
    use crate::types::{DecalRecord, ZBounds};
    use crate::visibility::{Visibility, VisibilityClassifier};

    /// Host copy of the cluster bitmask, laid out exactly like the GPU buffer.
    struct ClusterGrid {
        layout: ClusterGridLayout,
        words: Vec<u32>,
    }

    impl ClusterGrid {
        fn new(layout: ClusterGridLayout) -> Self {
            Self { layout, words: vec![0; layout.word_count() as usize] }
        }

        fn set(&mut self, x: u32, y: u32, z: u32, position: u32) {
            let (word, mask) = self.layout.bit_location(self.layout.cell_index(x, y, z), position);
            self.words[word] |= mask;
        }

        fn is_set(&self, x: u32, y: u32, z: u32, position: u32) -> bool {
            let (word, mask) = self.layout.bit_location(self.layout.cell_index(x, y, z), position);
            self.words[word] & mask != 0
        }

        /// What `cluster.frag.wgsl` does for one fragment of partition position `position`.
        fn shade_fragment(&mut self, px: u32, py: u32, position: u32, z_bounds: ZBounds) {
            let (x, y) = self.layout.tile_of_pixel(px, py);
            for z in z_bounds.min..=z_bounds.max {
                self.set(x, y, z, position);
            }
        }

        /// Shades one fragment per tile under the screen rectangle of the projected
        /// box, a conservative superset of the rasterized coverage.
        fn splat_decal(&mut self, obb: &Obb, camera: &CameraState, position: u32, z_bounds: ZBounds) {
            let view_projection = camera.view_projection();
            let (width, height) = (self.layout.width as f32, self.layout.height as f32);

            let mut min = Vec2::splat(f32::INFINITY);
            let mut max = Vec2::splat(f32::NEG_INFINITY);
            for corner in obb.corners() {
                let clip = view_projection * corner.extend(1.0);
                if clip.w <= 0.0 {
                    // Behind the eye: the projection is unbounded, cover the screen.
                    min = Vec2::ZERO;
                    max = Vec2::new(width - 1.0, height - 1.0);
                    break;
                }
                let ndc = clip.truncate().truncate() / clip.w;
                let pixel = (ndc * 0.5 + 0.5) * Vec2::new(width, height);
                min = min.min(pixel);
                max = max.max(pixel);
            }

            if max.x < 0.0 || max.y < 0.0 || min.x >= width || min.y >= height {
                return;
            }
            let (x0, y0) = self.layout.tile_of_pixel(min.x.max(0.0) as u32, min.y.max(0.0) as u32);
            let (x1, y1) = self.layout.tile_of_pixel(max.x.min(width - 1.0) as u32, max.y.min(height - 1.0) as u32);
            for y in y0..=y1 {
                for x in x0..=x1 {
                    self.shade_fragment(x * TILE_SIZE, y * TILE_SIZE, position, z_bounds);
                }
            }
        }

        /// Every set bit as `(x, y, z, position)`.
        fn set_bits(&self) -> Vec<(u32, u32, u32, u32)> {
            let layout = &self.layout;
            let mut bits = Vec::new();
            for (word_index, &word) in self.words.iter().enumerate() {
                let word_index = word_index as u32;
                let cell = word_index / layout.words_per_cell;
                let base = (word_index % layout.words_per_cell) * 32;
                let x = cell % layout.num_x_tiles;
                let y = (cell / layout.num_x_tiles) % layout.num_y_tiles;
                let z = cell / (layout.num_x_tiles * layout.num_y_tiles);
                for bit in (0..32).filter(|bit| word & (1 << bit) != 0) {
                    bits.push((x, y, z, base + bit));
                }
            }
            bits
        }
    }

    /// Replays the three subpasses on the host. Instance `k` of a pass is partition
    /// position `first_instance + k`, which is the bit the vertex shader forwards.
    fn build_clusters(
        grid: &mut ClusterGrid,
        records: &[DecalRecord],
        visibility: &Visibility,
        partition: &IndexPartition,
        camera: &CameraState,
    ) {
        for pass in ClusterPass::ALL {
            let (first_instance, instance_count) = pass.instance_range(partition);
            for instance in first_instance..first_instance + instance_count {
                let index = partition.indices[instance as usize] as usize;
                grid.splat_decal(&records[index].oriented_box(), camera, instance, visibility.z_bounds[index]);
            }
        }
    }

    fn fixture_camera() -> CameraState {
        CameraState::new(Vec3::ZERO, -Vec3::Z, Vec3::Y, 45f32.to_radians(), 0.1, 35.0, 1280, 720)
    }

    fn decal(position: Vec3, size: f32) -> DecalRecord {
        DecalRecord {
            position,
            normal: Vec3::Z,
            size: Vec3::splat(size),
            rotation: 0.0,
            angle_fade: 0.5,
            albedo: 1.0,
            intensity: 1.0,
            albedo_index: 0,
            normal_index: 0,
        }
    }

    #[test]
    fn test_layout_dimensions() {
        let layout = ClusterGridLayout::new(1280, 720);
        assert_eq!((layout.num_x_tiles, layout.num_y_tiles, layout.num_z_tiles), (80, 45, 16));
        assert_eq!(layout.words_per_cell, 2);
        assert_eq!(layout.size_in_bytes(), 80 * 45 * 16 * 2 * 4);

        let odd = ClusterGridLayout::new(1281, 17);
        assert_eq!((odd.num_x_tiles, odd.num_y_tiles), (81, 2));
    }

    #[test]
    fn test_bit_location() {
        let layout = ClusterGridLayout::new(64, 64);
        let cell = layout.cell_index(1, 2, 3);
        assert_eq!(cell, (3 * 4 + 2) * 4 + 1);
        assert_eq!(layout.bit_location(cell, 0), (cell as usize * 2, 1));
        assert_eq!(layout.bit_location(cell, 33), (cell as usize * 2 + 1, 2));
    }

    #[test]
    fn test_fragment_marks_every_depth_tile_in_range() {
        let mut grid = ClusterGrid::new(ClusterGridLayout::new(1280, 720));
        grid.shade_fragment(40, 56, 33, ZBounds { min: 1, max: 2 });
        assert_eq!(grid.set_bits(), vec![(2, 3, 1, 33), (2, 3, 2, 33)]);
    }

    #[test]
    fn test_single_decal_covers_single_cell() {
        let camera = fixture_camera();
        let records = [decal(Vec3::new(-2.278, 1.1543, -3.3), 0.02)];
        let visibility = VisibilityClassifier::default().classify(&records, &camera);
        let partition = IndexPartition::build(&visibility.straddling);
        assert_eq!(partition.num_straddling, 0);

        let mut grid = ClusterGrid::new(ClusterGridLayout::new(1280, 720));
        build_clusters(&mut grid, &records, &visibility, &partition, &camera);

        assert_eq!(grid.set_bits(), vec![(2, 3, 1, 0)]);
        assert_eq!(grid.words.iter().filter(|&&w| w != 0).count(), 1);
    }

    #[test]
    fn test_bits_follow_partition_positions() {
        let camera = fixture_camera();
        // Decal 1 surrounds the camera, so it moves to partition position 0.
        let records = [decal(Vec3::new(-2.278, 1.1543, -3.3), 0.02), decal(Vec3::ZERO, 2.0)];
        let visibility = VisibilityClassifier::default().classify(&records, &camera);
        let partition = IndexPartition::build(&visibility.straddling);
        assert_eq!(partition.indices, vec![1, 0]);
        assert_eq!(partition.num_straddling, 1);

        let mut grid = ClusterGrid::new(ClusterGridLayout::new(1280, 720));
        build_clusters(&mut grid, &records, &visibility, &partition, &camera);

        let bits = grid.set_bits();
        assert_eq!(bits.iter().filter(|bit| bit.3 == 1).collect::<Vec<_>>(), vec![&(2, 3, 1, 1)]);
        let straddling: Vec<_> = bits.iter().filter(|bit| bit.3 == 0).collect();
        assert_eq!(straddling.len(), 80 * 45);
        assert!(straddling.iter().all(|bit| bit.2 == 0));
        assert!(grid.is_set(0, 0, 0, 0) && grid.is_set(79, 44, 0, 0));
    }

    #[test]
    fn test_box_behind_camera_plane_covers_screen() {
        let camera = fixture_camera();
        let obb = Obb { center: Vec3::ZERO, extents: Vec3::ONE, orientation: glam::Mat3::IDENTITY };
        let mut grid = ClusterGrid::new(ClusterGridLayout::new(64, 32));
        grid.splat_decal(&obb, &camera, 0, ZBounds { min: 0, max: 0 });
        assert_eq!(grid.set_bits().len(), 4 * 2);
    }

    #[test]
    fn test_pass_ranges_split_partition() {
        let partition = IndexPartition::build(&[false, true, false, true, false]);
        assert_eq!(ClusterPass::StraddlingBackFaces.instance_range(&partition), (0, 2));
        assert_eq!(ClusterPass::OutsideBackFaces.instance_range(&partition), (2, 3));
        assert_eq!(ClusterPass::OutsideFrontFaces.instance_range(&partition), (2, 3));
        assert_eq!(ClusterPass::OutsideFrontFaces.cull_mode(), CullMode::Back);
        assert_eq!(ClusterPass::StraddlingBackFaces.cull_mode(), CullMode::Front);

        let empty = IndexPartition::default();
        assert!(ClusterPass::ALL.iter().all(|p| p.instance_range(&empty).1 == 0));
    }

    #[test]
    fn test_render_pass_chains_subpasses() {
        let desc = cluster_render_pass_descriptor();
        assert!(desc.attachments.is_empty());
        assert_eq!(desc.subpasses.len(), 3);
        let chained: Vec<_> = desc
            .dependencies
            .iter()
            .filter(|d| d.by_region)
            .map(|d| (d.src_subpass, d.dst_subpass))
            .collect();
        assert_eq!(
            chained,
            vec![
                (SubpassIndex::Index(0), SubpassIndex::Index(1)),
                (SubpassIndex::Index(1), SubpassIndex::Index(2)),
            ]
        );
    }

    #[test]
    fn test_unit_box_faces_wind_outward() {
        for triangle in UNIT_BOX_INDICES.chunks(3) {
            let [a, b, c] = [0, 1, 2].map(|k| Vec3::from(UNIT_BOX_VERTICES[triangle[k] as usize]));
            let normal = (b - a).cross(c - a);
            let centroid = (a + b + c) / 3.0;
            assert!(normal.dot(centroid) > 0.0, "triangle {:?} faces inward", triangle);
        }
    }
}
