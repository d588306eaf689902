use naga::back::spv;
use naga::front::glsl;

use crate::{LumeError, LumeResult};

pub enum ShaderSource<'a> {
    Glsl {
        source: &'a str,
        stage: naga::ShaderStage,
        defines: naga::FastHashMap<String, String>,
    },
    Wgsl(&'a str),
}

/// Parse, validate and translate a shader to SPIR-V words.
pub fn compile_shader(source: ShaderSource) -> LumeResult<Vec<u32>> {
    let module = match source {
        ShaderSource::Wgsl(src) => naga::front::wgsl::Frontend::new()
            .parse(src)
            .map_err(|e| LumeError::ShaderCompilationFailed(format!("WGSL parse error: {}", e.emit_to_string(src))))?,
        ShaderSource::Glsl { source, stage, defines } => {
            let mut parser = glsl::Frontend::default();
            let options = glsl::Options { stage, defines };
            parser
                .parse(&options, source)
                .map_err(|e| LumeError::ShaderCompilationFailed(format!("GLSL parse error: {:?}", e)))?
        }
    };

    let info = naga::valid::Validator::new(naga::valid::ValidationFlags::all(), naga::valid::Capabilities::all())
        .validate(&module)
        .map_err(|e| LumeError::ShaderCompilationFailed(format!("Naga validation error: {:?}", e)))?;

    let write_options = spv::Options::default();
    spv::write_vec(&module, &info, &write_options, None)
        .map_err(|e| LumeError::ShaderCompilationFailed(format!("SPIR-V write error: {:?}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SPIRV_MAGIC: u32 = 0x0723_0203;

    #[test]
    fn test_wgsl_compute_compiles() {
        let src = r#"
            @group(0) @binding(0) var<storage, read_write> data: array<f32>;

            @compute @workgroup_size(64)
            fn main(@builtin(global_invocation_id) id: vec3<u32>) {
                data[id.x] = data[id.x] * 2.0;
            }
        "#;
        let words = compile_shader(ShaderSource::Wgsl(src)).unwrap();
        assert_eq!(words[0], SPIRV_MAGIC);
    }

    #[test]
    fn test_wgsl_syntax_error_is_reported() {
        let err = compile_shader(ShaderSource::Wgsl("fn main( {")).unwrap_err();
        assert!(matches!(err, LumeError::ShaderCompilationFailed(_)));
    }
}
