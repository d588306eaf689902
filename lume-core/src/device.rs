use crate::LumeResult;

pub trait Device: Sized + Clone {
    type Surface: crate::instance::Surface;
    type Buffer: Buffer;
    type Texture: Texture;
    type TextureView: TextureView;
    type ShaderModule: ShaderModule;
    type RenderPass: RenderPass;
    type PipelineLayout: PipelineLayout;
    type GraphicsPipeline: GraphicsPipeline;
    type ComputePipeline: ComputePipeline;
    type CommandPool: CommandPool<Device = Self, CommandBuffer = Self::CommandBuffer>;
    type CommandBuffer: CommandBuffer<Device = Self>;
    type Framebuffer: Framebuffer;
    type Swapchain: Swapchain<TextureView = Self::TextureView, Semaphore = Self::Semaphore>;
    type BindGroupLayout: BindGroupLayout;
    type BindGroup: BindGroup;
    type Semaphore: Semaphore;
    type Fence: Fence;

    /// Wait for the device to be idle.
    fn wait_idle(&self) -> LumeResult<()>;

    fn create_command_pool(&self) -> LumeResult<Self::CommandPool>;
    fn create_semaphore(&self) -> LumeResult<Self::Semaphore>;
    fn create_fence(&self, signaled: bool) -> LumeResult<Self::Fence>;
    fn wait_for_fences(&self, fences: &[&Self::Fence], wait_all: bool, timeout: u64) -> LumeResult<()>;
    fn reset_fences(&self, fences: &[&Self::Fence]) -> LumeResult<()>;

    fn create_swapchain(&self, surface: &Self::Surface, descriptor: SwapchainDescriptor) -> LumeResult<Self::Swapchain>;

    fn create_shader_module(&self, code: &[u32]) -> LumeResult<Self::ShaderModule>;
    fn create_render_pass(&self, descriptor: RenderPassDescriptor) -> LumeResult<Self::RenderPass>;
    fn create_pipeline_layout(&self, descriptor: PipelineLayoutDescriptor<Self>) -> LumeResult<Self::PipelineLayout>;
    fn create_graphics_pipeline(&self, descriptor: GraphicsPipelineDescriptor<Self>) -> LumeResult<Self::GraphicsPipeline>;
    fn create_compute_pipeline(&self, descriptor: ComputePipelineDescriptor<Self>) -> LumeResult<Self::ComputePipeline>;
    fn create_framebuffer(&self, descriptor: FramebufferDescriptor<Self>) -> LumeResult<Self::Framebuffer>;
    fn create_buffer(&self, descriptor: BufferDescriptor) -> LumeResult<Self::Buffer>;
    fn create_texture(&self, descriptor: TextureDescriptor) -> LumeResult<Self::Texture>;
    fn create_texture_view(&self, texture: &Self::Texture, descriptor: TextureViewDescriptor) -> LumeResult<Self::TextureView>;
    fn create_bind_group_layout(&self, descriptor: BindGroupLayoutDescriptor) -> LumeResult<Self::BindGroupLayout>;
    fn create_bind_group(&self, descriptor: BindGroupDescriptor<Self>) -> LumeResult<Self::BindGroup>;

    /// Submit command buffers to the graphics queue.
    fn submit(
        &self,
        command_buffers: &[&Self::CommandBuffer],
        wait_semaphores: &[&Self::Semaphore],
        signal_semaphores: &[&Self::Semaphore],
        fence: Option<&Self::Fence>,
    ) -> LumeResult<()>;
}

pub trait CommandPool {
    type Device: Device;
    type CommandBuffer: CommandBuffer<Device = Self::Device>;
    fn allocate_command_buffer(&self) -> LumeResult<Self::CommandBuffer>;
}

pub trait CommandBuffer {
    type Device: Device;
    fn reset(&mut self) -> LumeResult<()>;
    fn begin(&mut self, usage: CommandBufferUsage) -> LumeResult<()>;
    fn end(&mut self) -> LumeResult<()>;

    fn begin_render_pass(
        &mut self,
        render_pass: &<Self::Device as Device>::RenderPass,
        framebuffer: &<Self::Device as Device>::Framebuffer,
        clear_values: &[ClearValue],
    );
    fn next_subpass(&mut self);
    fn end_render_pass(&mut self);

    fn bind_graphics_pipeline(&mut self, pipeline: &<Self::Device as Device>::GraphicsPipeline);
    fn bind_compute_pipeline(&mut self, pipeline: &<Self::Device as Device>::ComputePipeline);
    fn bind_vertex_buffer(&mut self, buffer: &<Self::Device as Device>::Buffer);
    fn bind_index_buffer(&mut self, buffer: &<Self::Device as Device>::Buffer, format: IndexFormat);
    fn bind_bind_group(&mut self, index: u32, bind_group: &<Self::Device as Device>::BindGroup);
    /// Push constants into the layout of the currently bound pipeline.
    fn set_push_constants(&mut self, stages: ShaderStage, offset: u32, data: &[u8]);
    fn set_viewport(&mut self, x: f32, y: f32, width: f32, height: f32);
    fn set_scissor(&mut self, x: i32, y: i32, width: u32, height: u32);
    fn draw(&mut self, vertex_count: u32, instance_count: u32, first_vertex: u32, first_instance: u32);
    fn draw_indexed(&mut self, index_count: u32, instance_count: u32, first_index: u32, vertex_offset: i32, first_instance: u32);
    fn dispatch(&mut self, x: u32, y: u32, z: u32);
    fn fill_buffer(&mut self, buffer: &<Self::Device as Device>::Buffer, offset: u64, size: u64, value: u32);
    fn buffer_barrier(&mut self, buffer: &<Self::Device as Device>::Buffer, barrier: BufferBarrier);
}

pub trait ShaderModule {}
pub trait RenderPass {}
pub trait PipelineLayout {}
pub trait GraphicsPipeline: Send + Sync {}
pub trait ComputePipeline: Send + Sync {}
pub trait Semaphore: Send + Sync {}
pub trait Fence: Send + Sync {}
pub trait Framebuffer {}
pub trait TextureView {}
pub trait Texture {}
pub trait Buffer {
    fn size(&self) -> u64;
    fn write_data(&self, offset: u64, data: &[u8]) -> LumeResult<()>;
    fn read_data(&self, offset: u64, data: &mut [u8]) -> LumeResult<()>;
}
pub trait BindGroupLayout {}
pub trait BindGroup {}

pub trait Swapchain {
    type TextureView: TextureView;
    type Semaphore: Semaphore;
    /// Returns `LumeError::SwapchainOutOfDate` when the surface changed underneath.
    fn acquire_next_image(&mut self, signal_semaphore: &Self::Semaphore) -> LumeResult<u32>;
    fn present(&mut self, image_index: u32, wait_semaphores: &[&Self::Semaphore]) -> LumeResult<()>;
    fn get_view(&self, index: u32) -> &Self::TextureView;
    fn image_count(&self) -> u32;
    fn extent(&self) -> (u32, u32);
    fn format(&self) -> TextureFormat;
}

/// Produces the flag helpers shared by the bitmask newtypes below.
macro_rules! flag_ops {
    ($ty:ident) => {
        impl $ty {
            pub const fn empty() -> Self {
                Self(0)
            }

            pub const fn contains(self, other: Self) -> bool {
                self.0 & other.0 == other.0
            }

            pub const fn intersects(self, other: Self) -> bool {
                self.0 & other.0 != 0
            }
        }

        impl std::ops::BitOr for $ty {
            type Output = Self;
            fn bitor(self, rhs: Self) -> Self {
                Self(self.0 | rhs.0)
            }
        }
    };
}

pub struct FramebufferDescriptor<'a, D: Device> {
    pub render_pass: &'a D::RenderPass,
    pub attachments: &'a [&'a D::TextureView],
    pub width: u32,
    pub height: u32,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum CommandBufferUsage {
    /// Recorded once, submitted once, then reset.
    OneTimeSubmit,
    /// Pre-recorded and submitted every time its frame slot comes around.
    Reusable,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ClearValue {
    Color([f32; 4]),
    DepthStencil(f32, u32),
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AttachmentLoadOp {
    Load,
    Clear,
    DontCare,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AttachmentStoreOp {
    Store,
    DontCare,
}

#[derive(Clone, Copy, Debug)]
pub struct AttachmentDescriptor {
    pub format: TextureFormat,
    pub load_op: AttachmentLoadOp,
    pub store_op: AttachmentStoreOp,
    pub initial_layout: ImageLayout,
    pub final_layout: ImageLayout,
}

/// Attachment indices refer to `RenderPassDescriptor::attachments`.
#[derive(Clone, Debug, Default)]
pub struct SubpassDescriptor {
    pub color_attachments: Vec<u32>,
    pub depth_attachment: Option<u32>,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SubpassIndex {
    External,
    Index(u32),
}

#[derive(Clone, Copy, Debug)]
pub struct SubpassDependency {
    pub src_subpass: SubpassIndex,
    pub dst_subpass: SubpassIndex,
    pub src_stage: PipelineStage,
    pub dst_stage: PipelineStage,
    pub src_access: Access,
    pub dst_access: Access,
    pub by_region: bool,
}

/// A render pass with any number of subpasses. A pass without attachments is
/// valid; its extent then comes from the framebuffer alone.
#[derive(Clone, Debug, Default)]
pub struct RenderPassDescriptor {
    pub attachments: Vec<AttachmentDescriptor>,
    pub subpasses: Vec<SubpassDescriptor>,
    pub dependencies: Vec<SubpassDependency>,
}

impl RenderPassDescriptor {
    /// One subpass with one cleared colour target and an optional cleared depth target.
    pub fn single(color_format: TextureFormat, color_final_layout: ImageLayout, depth_format: Option<TextureFormat>) -> Self {
        let mut attachments = vec![AttachmentDescriptor {
            format: color_format,
            load_op: AttachmentLoadOp::Clear,
            store_op: AttachmentStoreOp::Store,
            initial_layout: ImageLayout::Undefined,
            final_layout: color_final_layout,
        }];
        let depth_attachment = depth_format.map(|format| {
            attachments.push(AttachmentDescriptor {
                format,
                load_op: AttachmentLoadOp::Clear,
                store_op: AttachmentStoreOp::DontCare,
                initial_layout: ImageLayout::Undefined,
                final_layout: ImageLayout::DepthStencilAttachment,
            });
            1
        });

        Self {
            attachments,
            subpasses: vec![SubpassDescriptor { color_attachments: vec![0], depth_attachment }],
            dependencies: vec![SubpassDependency {
                src_subpass: SubpassIndex::External,
                dst_subpass: SubpassIndex::Index(0),
                src_stage: PipelineStage::COLOR_ATTACHMENT_OUTPUT | PipelineStage::EARLY_FRAGMENT_TESTS,
                dst_stage: PipelineStage::COLOR_ATTACHMENT_OUTPUT | PipelineStage::EARLY_FRAGMENT_TESTS,
                src_access: Access::empty(),
                dst_access: Access::COLOR_ATTACHMENT_WRITE | Access::DEPTH_STENCIL_ATTACHMENT_WRITE,
                by_region: false,
            }],
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TextureFormat {
    Bgra8UnormSrgb,
    Bgra8Unorm,
    Rgba8UnormSrgb,
    Rgba8Unorm,
    Rgba16Float,
    Rg32Uint,
    R32Uint,
    Depth32Float,
}

impl TextureFormat {
    pub fn is_depth(self) -> bool {
        matches!(self, TextureFormat::Depth32Float)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ImageLayout {
    Undefined,
    General,
    TransferSrc,
    TransferDst,
    ShaderReadOnly,
    ColorAttachment,
    DepthStencilAttachment,
    Present,
}

pub struct TextureDescriptor {
    pub width: u32,
    pub height: u32,
    pub depth: u32,
    pub format: TextureFormat,
    pub usage: TextureUsage,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct TextureUsage(pub u32);

impl TextureUsage {
    pub const TEXTURE_BINDING: Self = Self(1 << 0);
    pub const STORAGE_BINDING: Self = Self(1 << 1);
    pub const RENDER_ATTACHMENT: Self = Self(1 << 2);
    pub const DEPTH_STENCIL_ATTACHMENT: Self = Self(1 << 3);
    pub const COPY_SRC: Self = Self(1 << 4);
    pub const COPY_DST: Self = Self(1 << 5);
}

flag_ops!(TextureUsage);

pub struct TextureViewDescriptor {
    pub format: Option<TextureFormat>,
}

#[derive(Clone, Copy, Debug)]
pub struct PushConstantRange {
    pub stages: ShaderStage,
    pub offset: u32,
    pub size: u32,
}

pub struct PipelineLayoutDescriptor<'a, D: Device> {
    pub bind_group_layouts: &'a [&'a D::BindGroupLayout],
    pub push_constant_ranges: &'a [PushConstantRange],
}

pub struct GraphicsPipelineDescriptor<'a, D: Device> {
    pub vertex_shader: &'a D::ShaderModule,
    pub fragment_shader: &'a D::ShaderModule,
    pub render_pass: &'a D::RenderPass,
    /// Index of the subpass this pipeline is used in.
    pub subpass: u32,
    pub layout: &'a D::PipelineLayout,
    pub primitive: PrimitiveState,
    pub vertex_layout: Option<VertexLayout>,
    /// `None` disables depth testing and depth writes.
    pub depth_stencil: Option<DepthStencilState>,
    /// Number of colour attachments written by the subpass.
    pub color_target_count: u32,
}

#[derive(Clone, Copy, Debug)]
pub struct DepthStencilState {
    pub format: TextureFormat,
    pub depth_write_enabled: bool,
    pub depth_compare: CompareFunction,
}

#[derive(Clone, Copy, Debug)]
pub enum CompareFunction {
    Never,
    Less,
    Equal,
    LessEqual,
    Greater,
    NotEqual,
    GreaterEqual,
    Always,
}

#[derive(Clone, Copy, Debug)]
pub struct PrimitiveState {
    pub topology: PrimitiveTopology,
    pub cull_mode: CullMode,
    pub front_face: FrontFace,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PrimitiveTopology {
    TriangleList,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum CullMode {
    None,
    Front,
    Back,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum FrontFace {
    CounterClockwise,
    Clockwise,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum IndexFormat {
    Uint16,
    Uint32,
}

#[derive(Clone, Debug)]
pub struct VertexAttribute {
    pub location: u32,
    pub format: VertexFormat,
    pub offset: u32,
}

#[derive(Clone, Copy, Debug)]
pub enum VertexFormat {
    Float32x2,
    Float32x3,
    Float32x4,
}

#[derive(Clone, Debug)]
pub struct VertexLayout {
    pub array_stride: u32,
    pub attributes: Vec<VertexAttribute>,
}

pub struct SwapchainDescriptor {
    pub width: u32,
    pub height: u32,
    pub image_count: u32,
}

/// Where a buffer lives and which side may map it.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MemoryLocation {
    GpuOnly,
    /// Host-visible, written by the CPU and read by the GPU.
    CpuToGpu,
    /// Host-visible and cached, written by the GPU and read back by the CPU.
    GpuToCpu,
}

pub struct BufferDescriptor {
    pub size: u64,
    pub usage: BufferUsage,
    pub location: MemoryLocation,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct BufferUsage(pub u32);

impl BufferUsage {
    pub const VERTEX: Self = Self(1 << 0);
    pub const INDEX: Self = Self(1 << 1);
    pub const UNIFORM: Self = Self(1 << 2);
    pub const STORAGE: Self = Self(1 << 3);
    pub const COPY_SRC: Self = Self(1 << 4);
    pub const COPY_DST: Self = Self(1 << 5);
}

flag_ops!(BufferUsage);

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct PipelineStage(pub u32);

impl PipelineStage {
    pub const TOP_OF_PIPE: Self = Self(1 << 0);
    pub const VERTEX_INPUT: Self = Self(1 << 1);
    pub const VERTEX_SHADER: Self = Self(1 << 2);
    pub const FRAGMENT_SHADER: Self = Self(1 << 3);
    pub const EARLY_FRAGMENT_TESTS: Self = Self(1 << 4);
    pub const LATE_FRAGMENT_TESTS: Self = Self(1 << 5);
    pub const COLOR_ATTACHMENT_OUTPUT: Self = Self(1 << 6);
    pub const COMPUTE_SHADER: Self = Self(1 << 7);
    pub const TRANSFER: Self = Self(1 << 8);
    pub const BOTTOM_OF_PIPE: Self = Self(1 << 9);
    pub const HOST: Self = Self(1 << 10);
    pub const ALL_COMMANDS: Self = Self(1 << 11);
}

flag_ops!(PipelineStage);

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Access(pub u32);

impl Access {
    pub const INDEX_READ: Self = Self(1 << 0);
    pub const VERTEX_ATTRIBUTE_READ: Self = Self(1 << 1);
    pub const UNIFORM_READ: Self = Self(1 << 2);
    pub const SHADER_READ: Self = Self(1 << 3);
    pub const SHADER_WRITE: Self = Self(1 << 4);
    pub const COLOR_ATTACHMENT_WRITE: Self = Self(1 << 5);
    pub const DEPTH_STENCIL_ATTACHMENT_WRITE: Self = Self(1 << 6);
    pub const TRANSFER_READ: Self = Self(1 << 7);
    pub const TRANSFER_WRITE: Self = Self(1 << 8);
    pub const HOST_READ: Self = Self(1 << 9);
    pub const HOST_WRITE: Self = Self(1 << 10);
    pub const MEMORY_READ: Self = Self(1 << 11);
    pub const MEMORY_WRITE: Self = Self(1 << 12);
}

flag_ops!(Access);

/// Execution and memory dependency on a byte range of one buffer.
#[derive(Clone, Copy, Debug)]
pub struct BufferBarrier {
    pub src_stage: PipelineStage,
    pub dst_stage: PipelineStage,
    pub src_access: Access,
    pub dst_access: Access,
    pub offset: u64,
    /// `None` covers the buffer from `offset` to its end.
    pub size: Option<u64>,
}

impl BufferBarrier {
    /// Barrier over the whole buffer.
    pub fn whole(src_stage: PipelineStage, src_access: Access, dst_stage: PipelineStage, dst_access: Access) -> Self {
        Self { src_stage, dst_stage, src_access, dst_access, offset: 0, size: None }
    }

    pub fn range(mut self, offset: u64, size: u64) -> Self {
        self.offset = offset;
        self.size = Some(size);
        self
    }
}

pub struct BindGroupLayoutDescriptor {
    pub entries: Vec<BindGroupLayoutEntry>,
}

pub struct BindGroupLayoutEntry {
    pub binding: u32,
    pub visibility: ShaderStage,
    pub ty: BindingType,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct ShaderStage(pub u32);

impl ShaderStage {
    pub const VERTEX: Self = Self(1 << 0);
    pub const FRAGMENT: Self = Self(1 << 1);
    pub const COMPUTE: Self = Self(1 << 2);
}

flag_ops!(ShaderStage);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BindingType {
    UniformBuffer,
    StorageBuffer,
    SampledTexture,
}

pub struct BindGroupDescriptor<'a, D: Device> {
    pub layout: &'a D::BindGroupLayout,
    pub entries: Vec<BindGroupEntry<'a, D>>,
}

pub struct BindGroupEntry<'a, D: Device> {
    pub binding: u32,
    pub resource: BindingResource<'a, D>,
}

pub enum BindingResource<'a, D: Device> {
    Buffer(&'a D::Buffer),
    /// A window into a buffer, used for per-frame slots of one allocation.
    BufferRange { buffer: &'a D::Buffer, offset: u64, size: u64 },
    TextureView(&'a D::TextureView),
}

pub struct ComputePipelineDescriptor<'a, D: Device> {
    pub shader: &'a D::ShaderModule,
    pub layout: &'a D::PipelineLayout,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_contains_and_intersects() {
        let usage = BufferUsage::STORAGE | BufferUsage::COPY_DST;
        assert!(usage.contains(BufferUsage::STORAGE));
        assert!(!usage.contains(BufferUsage::STORAGE | BufferUsage::VERTEX));
        assert!(usage.intersects(BufferUsage::STORAGE | BufferUsage::VERTEX));
        assert!(!PipelineStage::empty().intersects(PipelineStage::HOST));
    }

    #[test]
    fn test_single_render_pass_with_depth() {
        let desc = RenderPassDescriptor::single(TextureFormat::Bgra8UnormSrgb, ImageLayout::Present, Some(TextureFormat::Depth32Float));
        assert_eq!(desc.attachments.len(), 2);
        assert_eq!(desc.subpasses[0].color_attachments, vec![0]);
        assert_eq!(desc.subpasses[0].depth_attachment, Some(1));
        assert!(desc.attachments[1].format.is_depth());
    }

    #[test]
    fn test_buffer_barrier_range() {
        let barrier = BufferBarrier::whole(PipelineStage::HOST, Access::HOST_WRITE, PipelineStage::VERTEX_SHADER, Access::SHADER_READ)
            .range(256, 64);
        assert_eq!(barrier.offset, 256);
        assert_eq!(barrier.size, Some(64));
    }
}
