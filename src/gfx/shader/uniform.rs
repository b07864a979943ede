//! # Uniform values and layouts
//!
//! [`UniformValue`] is the closed set of values the host can push into a
//! program. [`UniformLayout`] describes where each named uniform lives inside
//! a program's uniform block, following the WGSL uniform address space rules
//! (the same rules the shader's `struct` declaration is laid out with), so a
//! layout doubles as the name -> location table of a program.

use cgmath::{Matrix3, Matrix4, Vector2, Vector3, Vector4};

/// A typed uniform value
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Int(i32),
    Float(f32),
    Vec2(Vector2<f32>),
    Vec3(Vector3<f32>),
    Vec4(Vector4<f32>),
    Mat3(Matrix3<f32>),
    Mat4(Matrix4<f32>),
}

impl UniformValue {
    pub fn kind(&self) -> UniformKind {
        match self {
            UniformValue::Int(_) => UniformKind::Int,
            UniformValue::Float(_) => UniformKind::Float,
            UniformValue::Vec2(_) => UniformKind::Vec2,
            UniformValue::Vec3(_) => UniformKind::Vec3,
            UniformValue::Vec4(_) => UniformKind::Vec4,
            UniformValue::Mat3(_) => UniformKind::Mat3,
            UniformValue::Mat4(_) => UniformKind::Mat4,
        }
    }

    /// Writes the value into `dst` using its uniform-block representation
    ///
    /// `dst` must be at least `self.kind().size()` bytes long.
    pub fn write_to(&self, dst: &mut [u8]) {
        match self {
            UniformValue::Int(v) => dst[..4].copy_from_slice(bytemuck::bytes_of(v)),
            UniformValue::Float(v) => dst[..4].copy_from_slice(bytemuck::bytes_of(v)),
            UniformValue::Vec2(v) => {
                let raw: [f32; 2] = (*v).into();
                dst[..8].copy_from_slice(bytemuck::bytes_of(&raw));
            }
            UniformValue::Vec3(v) => {
                let raw: [f32; 3] = (*v).into();
                dst[..12].copy_from_slice(bytemuck::bytes_of(&raw));
            }
            UniformValue::Vec4(v) => {
                let raw: [f32; 4] = (*v).into();
                dst[..16].copy_from_slice(bytemuck::bytes_of(&raw));
            }
            UniformValue::Mat3(m) => {
                // mat3x3 columns are padded to vec4
                for (i, column) in [m.x, m.y, m.z].iter().enumerate() {
                    let raw: [f32; 3] = (*column).into();
                    dst[i * 16..i * 16 + 12].copy_from_slice(bytemuck::bytes_of(&raw));
                }
            }
            UniformValue::Mat4(m) => {
                let raw: [[f32; 4]; 4] = (*m).into();
                dst[..64].copy_from_slice(bytemuck::bytes_of(&raw));
            }
        }
    }
}

impl From<bool> for UniformValue {
    fn from(value: bool) -> Self {
        UniformValue::Int(value as i32)
    }
}

/// Shader-side type of a uniform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniformKind {
    Int,
    Float,
    Vec2,
    Vec3,
    Vec4,
    Mat3,
    Mat4,
}

impl UniformKind {
    pub fn align(self) -> u32 {
        match self {
            UniformKind::Int | UniformKind::Float => 4,
            UniformKind::Vec2 => 8,
            UniformKind::Vec3 | UniformKind::Vec4 | UniformKind::Mat3 | UniformKind::Mat4 => 16,
        }
    }

    pub fn size(self) -> u32 {
        match self {
            UniformKind::Int | UniformKind::Float => 4,
            UniformKind::Vec2 => 8,
            UniformKind::Vec3 => 12,
            UniformKind::Vec4 => 16,
            UniformKind::Mat3 => 48,
            UniformKind::Mat4 => 64,
        }
    }
}

/// Handle to one uniform of a program
///
/// The invalid location is returned for names a program does not declare;
/// uploading to it is a silent no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UniformLocation(Option<u32>);

impl UniformLocation {
    pub const INVALID: UniformLocation = UniformLocation(None);

    pub fn new(index: u32) -> Self {
        Self(Some(index))
    }

    pub fn index(self) -> Option<u32> {
        self.0
    }

    pub fn is_valid(self) -> bool {
        self.0.is_some()
    }
}

impl Default for UniformLocation {
    fn default() -> Self {
        Self::INVALID
    }
}

/// One named uniform inside a block
#[derive(Debug, Clone, PartialEq)]
pub struct UniformField {
    pub name: String,
    pub kind: UniformKind,
    pub offset: u32,
}

/// Byte layout of a program's uniform block
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UniformLayout {
    fields: Vec<UniformField>,
    size: u32,
}

impl UniformLayout {
    pub fn builder() -> UniformLayoutBuilder {
        UniformLayoutBuilder::default()
    }

    /// Looks up a uniform by its full name (e.g. `lights[2].position`)
    pub fn location(&self, name: &str) -> UniformLocation {
        self.fields
            .iter()
            .position(|field| field.name == name)
            .map(|index| UniformLocation::new(index as u32))
            .unwrap_or(UniformLocation::INVALID)
    }

    pub fn field(&self, location: UniformLocation) -> Option<&UniformField> {
        location
            .index()
            .and_then(|index| self.fields.get(index as usize))
    }

    pub fn fields(&self) -> &[UniformField] {
        &self.fields
    }

    /// Total block size in bytes, rounded up to 16
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Writes `value` into `block` at the location's offset
    ///
    /// Returns `false` when the location is invalid or the value's type does
    /// not match the declared type; the block is left untouched in that case.
    pub fn write(&self, block: &mut [u8], location: UniformLocation, value: &UniformValue) -> bool {
        let Some(field) = self.field(location) else {
            return false;
        };
        if field.kind != value.kind() {
            return false;
        }
        let start = field.offset as usize;
        let end = start + field.kind.size() as usize;
        if end > block.len() {
            return false;
        }
        value.write_to(&mut block[start..end]);
        true
    }
}

fn round_up(value: u32, align: u32) -> u32 {
    value.div_ceil(align) * align
}

/// Builds a [`UniformLayout`] field by field
///
/// Fields must be declared in the same order as the members of the WGSL
/// struct they describe.
#[derive(Debug, Default)]
pub struct UniformLayoutBuilder {
    fields: Vec<UniformField>,
    offset: u32,
}

impl UniformLayoutBuilder {
    pub fn field(mut self, name: &str, kind: UniformKind) -> Self {
        self.push(name.to_string(), kind);
        self
    }

    /// Declares a nested struct; members are named `name.member`
    pub fn struct_field(mut self, name: &str, members: &[(&str, UniformKind)]) -> Self {
        self.push_struct(name, members);
        self
    }

    /// Declares a fixed-size array of structs; members are named `name[i].member`
    pub fn struct_array(mut self, name: &str, count: usize, members: &[(&str, UniformKind)]) -> Self {
        for i in 0..count {
            self.push_struct(&format!("{name}[{i}]"), members);
        }
        self
    }

    pub fn build(self) -> UniformLayout {
        UniformLayout {
            size: round_up(self.offset, 16),
            fields: self.fields,
        }
    }

    fn push(&mut self, name: String, kind: UniformKind) {
        let offset = round_up(self.offset, kind.align());
        self.fields.push(UniformField { name, kind, offset });
        self.offset = offset + kind.size();
    }

    fn push_struct(&mut self, prefix: &str, members: &[(&str, UniformKind)]) {
        // Structs in the uniform address space align to 16 and pad their size to 16
        self.offset = round_up(self.offset, 16);
        let start = self.offset;
        for (member, kind) in members {
            self.push(format!("{prefix}.{member}"), *kind);
        }
        self.offset = start + round_up(self.offset - start, 16);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{SquareMatrix, Vector3};

    #[test]
    fn test_scalars_pack_after_vec3() {
        let layout = UniformLayout::builder()
            .field("viewPosition", UniformKind::Vec3)
            .field("lightCount", UniformKind::Int)
            .field("fogColor", UniformKind::Vec3)
            .build();

        assert_eq!(layout.fields()[0].offset, 0);
        assert_eq!(layout.fields()[1].offset, 12);
        assert_eq!(layout.fields()[2].offset, 16);
        assert_eq!(layout.size(), 32);
    }

    #[test]
    fn test_struct_array_stride_is_rounded_to_16() {
        let members = [
            ("type", UniformKind::Int),
            ("position", UniformKind::Vec3),
            ("cutOff", UniformKind::Float),
        ];
        let layout = UniformLayout::builder()
            .field("alpha", UniformKind::Float)
            .struct_array("lights", 2, &members)
            .build();

        let first = layout.field(layout.location("lights[0].type")).unwrap();
        let second = layout.field(layout.location("lights[1].type")).unwrap();
        assert_eq!(first.offset, 16);
        assert_eq!(layout.field(layout.location("lights[0].position")).unwrap().offset, 32);
        assert_eq!(layout.field(layout.location("lights[0].cutOff")).unwrap().offset, 44);
        assert_eq!(second.offset - first.offset, 32);
    }

    #[test]
    fn test_unknown_name_yields_invalid_location() {
        let layout = UniformLayout::builder()
            .field("model", UniformKind::Mat4)
            .build();
        assert_eq!(layout.location("useTexture"), UniformLocation::INVALID);
        assert!(layout.location("model").is_valid());
    }

    #[test]
    fn test_write_rejects_mismatched_type_and_invalid_location() {
        let layout = UniformLayout::builder()
            .field("alpha", UniformKind::Float)
            .field("model", UniformKind::Mat4)
            .build();
        let mut block = vec![0u8; layout.size() as usize];

        assert!(!layout.write(&mut block, layout.location("alpha"), &UniformValue::Int(3)));
        assert!(!layout.write(&mut block, UniformLocation::INVALID, &UniformValue::Float(1.0)));
        assert!(block.iter().all(|b| *b == 0));

        assert!(layout.write(&mut block, layout.location("alpha"), &UniformValue::Float(0.5)));
        assert_eq!(&block[0..4], bytemuck::bytes_of(&0.5f32));

        let identity = UniformValue::Mat4(Matrix4::identity());
        assert!(layout.write(&mut block, layout.location("model"), &identity));
        assert_eq!(&block[16..20], bytemuck::bytes_of(&1.0f32));
    }

    #[test]
    fn test_vec3_write_leaves_padding_alone() {
        let mut dst = [0xffu8; 16];
        UniformValue::Vec3(Vector3::new(1.0, 2.0, 3.0)).write_to(&mut dst);
        assert_eq!(&dst[8..12], bytemuck::bytes_of(&3.0f32));
        assert_eq!(&dst[12..16], &[0xff; 4]);
    }
}
