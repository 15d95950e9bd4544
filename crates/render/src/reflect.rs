//! Minimal WGSL interface reflection.
//!
//! Only what the cube program needs: the `@location` members of the vertex
//! input struct and the field order of the uniform block. Struct bodies are
//! found textually; line comments are ignored.

use crate::error::ContextError;
use crate::shaders::{UNIFORM_STRUCT, VERTEX_INPUT_STRUCT};

/// Size of one `mat4x4<f32>` uniform field.
pub const MATRIX_BYTES: u64 = 64;

/// A member of a WGSL struct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub name: String,
    pub ty: String,
    pub location: Option<u32>,
}

/// Attribute and uniform layout of a vertex shader.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShaderInterface {
    attributes: Vec<(String, u32)>,
    uniforms: Vec<String>,
}

impl ShaderInterface {
    /// Reflect the vertex shader interface.
    ///
    /// The vertex input struct is required and every member must carry a
    /// `@location`. The uniform block is optional; its fields must all be
    /// `mat4x4<f32>`.
    pub fn reflect(vertex_source: &str) -> Result<Self, ContextError> {
        let inputs = struct_members(vertex_source, VERTEX_INPUT_STRUCT).ok_or_else(|| {
            ContextError::Shader(format!(
                "vertex shader declares no `{VERTEX_INPUT_STRUCT}` struct"
            ))
        })?;

        let mut attributes = Vec::with_capacity(inputs.len());
        for member in inputs {
            let location = member.location.ok_or_else(|| {
                ContextError::Shader(format!("vertex input `{}` has no @location", member.name))
            })?;
            attributes.push((member.name, location));
        }

        let mut uniforms = Vec::new();
        for member in struct_members(vertex_source, UNIFORM_STRUCT).unwrap_or_default() {
            if !is_mat4(&member.ty) {
                return Err(ContextError::Shader(format!(
                    "uniform `{}` has unsupported type `{}`",
                    member.name, member.ty
                )));
            }
            uniforms.push(member.name);
        }

        Ok(Self {
            attributes,
            uniforms,
        })
    }

    /// `-1` when `name` is not a vertex input.
    pub fn attrib_location(&self, name: &str) -> i32 {
        self.attributes
            .iter()
            .find(|(attr, _)| attr == name)
            .and_then(|(_, location)| i32::try_from(*location).ok())
            .unwrap_or(-1)
    }

    pub fn attributes(&self) -> &[(String, u32)] {
        &self.attributes
    }

    pub fn uniforms(&self) -> &[String] {
        &self.uniforms
    }

    pub fn uniform_slot(&self, name: &str) -> Option<u32> {
        self.uniforms
            .iter()
            .position(|u| u == name)
            .and_then(|i| u32::try_from(i).ok())
    }

    pub fn uniform_name(&self, slot: u32) -> Option<&str> {
        self.uniforms.get(slot as usize).map(String::as_str)
    }

    /// Byte offset of a slot inside the uniform block.
    pub fn uniform_offset(slot: u32) -> u64 {
        u64::from(slot) * MATRIX_BYTES
    }

    /// Total uniform block size in bytes.
    pub fn uniform_block_size(&self) -> u64 {
        self.uniforms.len() as u64 * MATRIX_BYTES
    }
}

/// Members of `struct <name> { ... }`, or `None` if the struct is absent.
pub fn struct_members(source: &str, name: &str) -> Option<Vec<Member>> {
    let source = strip_line_comments(source);
    let body = struct_body(&source, name)?;
    Some(
        split_top_level(body)
            .into_iter()
            .filter_map(parse_member)
            .collect(),
    )
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Length of the identifier at the start of `text`.
fn ident_len(text: &str) -> usize {
    text.find(|c: char| !is_ident_char(c)).unwrap_or(text.len())
}

fn is_mat4(ty: &str) -> bool {
    let compact: String = ty.chars().filter(|c| !c.is_whitespace()).collect();
    compact == "mat4x4<f32>" || compact == "mat4x4f"
}

fn strip_line_comments(source: &str) -> String {
    source
        .lines()
        .map(|line| line.split_once("//").map_or(line, |(code, _)| code))
        .collect::<Vec<_>>()
        .join("\n")
}

fn struct_body<'a>(source: &'a str, name: &str) -> Option<&'a str> {
    const KEYWORD: &str = "struct";
    let mut offset = 0;
    while let Some(found) = source[offset..].find(KEYWORD) {
        let start = offset + found;
        offset = start + KEYWORD.len();

        let keyword_alone = source[..start]
            .chars()
            .next_back()
            .is_none_or(|c| !is_ident_char(c));
        let after = &source[offset..];
        let ident = after.trim_start();
        if !keyword_alone || ident.len() == after.len() {
            continue;
        }

        let len = ident_len(ident);
        if &ident[..len] != name {
            continue;
        }
        let body = ident[len..].trim_start().strip_prefix('{')?;
        let end = body.find('}')?;
        return Some(&body[..end]);
    }
    None
}

fn split_top_level(body: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (i, c) in body.char_indices() {
        match c {
            '<' | '(' => depth += 1,
            '>' | ')' => depth -= 1,
            ',' if depth == 0 => {
                parts.push(&body[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&body[start..]);
    parts
        .into_iter()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect()
}

fn parse_member(text: &str) -> Option<Member> {
    let mut rest = text.trim();
    let mut location = None;
    while let Some(attr) = rest.strip_prefix('@') {
        let name_len = ident_len(attr);
        let attr_name = &attr[..name_len];
        let mut after = attr[name_len..].trim_start();
        if let Some(args) = after.strip_prefix('(') {
            let close = args.find(')')?;
            if attr_name == "location" {
                location = args[..close].trim().parse().ok();
            }
            after = &args[close + 1..];
        }
        rest = after.trim_start();
    }

    let (name, ty) = rest.split_once(':')?;
    Some(Member {
        name: name.trim().to_string(),
        ty: ty.trim().to_string(),
        location,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shaders::{
        COLOR_ATTRIBUTE, FRAGMENT_SHADER, MODEL_UNIFORM, POSITION_ATTRIBUTE, PROJECTION_UNIFORM,
        VERTEX_SHADER, VIEW_UNIFORM,
    };

    #[test]
    fn cube_shader_attributes_resolve() {
        let iface = ShaderInterface::reflect(VERTEX_SHADER).unwrap();
        assert_eq!(iface.attrib_location(POSITION_ATTRIBUTE), 0);
        assert_eq!(iface.attrib_location(COLOR_ATTRIBUTE), 1);
        assert_eq!(iface.attrib_location("a_normal"), -1);
        assert_eq!(iface.attributes().len(), 2);
    }

    #[test]
    fn cube_shader_uniform_order() {
        let iface = ShaderInterface::reflect(VERTEX_SHADER).unwrap();
        assert_eq!(iface.uniform_slot(MODEL_UNIFORM), Some(0));
        assert_eq!(iface.uniform_slot(VIEW_UNIFORM), Some(1));
        assert_eq!(iface.uniform_slot(PROJECTION_UNIFORM), Some(2));
        assert_eq!(iface.uniform_slot("u_normal"), None);
        assert_eq!(iface.uniform_name(2), Some(PROJECTION_UNIFORM));
        assert_eq!(iface.uniform_block_size(), 3 * MATRIX_BYTES);
        assert_eq!(ShaderInterface::uniform_offset(2), 128);
    }

    #[test]
    fn vertex_output_locations_are_not_attributes() {
        let iface = ShaderInterface::reflect(VERTEX_SHADER).unwrap();
        assert_eq!(iface.attrib_location("v_color"), -1);
    }

    #[test]
    fn missing_input_struct_is_an_error() {
        let err = ShaderInterface::reflect(FRAGMENT_SHADER).unwrap_err();
        assert!(err.to_string().contains("VertexInput"));
    }

    #[test]
    fn input_without_location_is_an_error() {
        let src = "struct VertexInput { a_position: vec3<f32>, };";
        assert!(ShaderInterface::reflect(src).is_err());
    }

    #[test]
    fn non_matrix_uniform_is_an_error() {
        let src = r#"
            struct Uniforms { u_tint: vec4<f32>, };
            struct VertexInput { @location(0) a_position: vec3<f32>, };
        "#;
        let err = ShaderInterface::reflect(src).unwrap_err();
        assert!(err.to_string().contains("u_tint"));
    }

    #[test]
    fn comments_and_similar_names_are_skipped() {
        let src = r#"
            // struct VertexInput { @location(9) fake: f32, };
            struct VertexInputs { @location(7) wrong: f32, };
            struct VertexInput {
                @location(2) a_uv: vec2<f32>, // trailing note
                @builtin(vertex_index) idx: u32,
                @location(3) @interpolate(flat) a_id: u32,
            };
        "#;
        let members = struct_members(src, "VertexInput").unwrap();
        let names: Vec<_> = members.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["a_uv", "idx", "a_id"]);
        assert_eq!(members[0].location, Some(2));
        assert_eq!(members[1].location, None);
        assert_eq!(members[2].location, Some(3));
        assert_eq!(members[0].ty, "vec2<f32>");
    }

    #[test]
    fn generic_commas_do_not_split_members() {
        let src = "struct Block { a: array<f32, 4>, b: mat4x4f }";
        let members = struct_members(src, "Block").unwrap();
        assert_eq!(members.len(), 2);
        assert_eq!(members[0].ty, "array<f32, 4>");
        assert!(is_mat4(&members[1].ty));
    }
}
