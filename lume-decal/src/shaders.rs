//! WGSL sources. Every stage is prefixed with the shared declarations in
//! `common.wgsl`, which mirror the `#[repr(C)]` structs in [`crate::types`].

use lume_core::shader::{compile_shader, ShaderSource};
use lume_core::LumeResult;

pub const COMMON: &str = include_str!("../shaders/common.wgsl");

pub const CLUSTER_VERTEX: &str = concat!(include_str!("../shaders/common.wgsl"), include_str!("../shaders/cluster.vert.wgsl"));
pub const CLUSTER_FRAGMENT: &str = concat!(include_str!("../shaders/common.wgsl"), include_str!("../shaders/cluster.frag.wgsl"));
pub const PICK_COMPUTE: &str = concat!(include_str!("../shaders/common.wgsl"), include_str!("../shaders/pick.comp.wgsl"));

pub fn compile(source: &str) -> LumeResult<Vec<u32>> {
    compile_shader(ShaderSource::Wgsl(source))
}

/// Prepends the shared declarations to a stage defined outside this crate.
pub fn with_common(stage: &str) -> String {
    format!("{}\n{}", COMMON, stage)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cluster_shaders_compile() {
        assert!(!compile(CLUSTER_VERTEX).unwrap().is_empty());
        assert!(!compile(CLUSTER_FRAGMENT).unwrap().is_empty());
    }

    #[test]
    fn test_pick_shader_compiles() {
        assert!(!compile(PICK_COMPUTE).unwrap().is_empty());
    }

    #[test]
    fn test_with_common_exposes_shared_structs() {
        let source = with_common(
            "@group(0) @binding(0) var<storage, read> result: PickResult;\n\
             @compute @workgroup_size(1) fn main() { let p = result.position; }",
        );
        assert!(compile(&source).is_ok());
    }
}
