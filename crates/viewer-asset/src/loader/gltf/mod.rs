use std::{
    error::Error,
    fmt::{self, Display, Formatter},
    path::Path,
};

use glam::{Mat4, Quat, Vec3};
use gltf::{
    accessor::{DataType, Dimensions},
    animation::{self, Property},
    scene::Transform,
    Accessor, Animation, Document, Node, Scene, Skin,
};
use log::{info, warn};

use crate::{
    animation::{
        AnimationAsset, AnimationChannelAsset, AnimationPath, AnimationSamplerAsset,
        AnimationValues, Interpolation,
    },
    model::ModelAsset,
    node::{DecomposedTransform, MatrixNodeTransform, NodeAsset, NodeTransform},
    scene::SceneAsset,
    skin::SkinAsset,
};

use super::{chunk_mat4, chunk_vec3, chunk_vec4};

#[derive(Debug)]
pub enum GltfLoaderError {
    Gltf(gltf::Error),
    SparseAccessor(usize),
    BadAccessorDataType(usize, DataType),
    BadAccessorDimensions(usize, Dimensions, Dimensions),
    AccessorOutOfBounds(usize, usize, usize),
    MissingBuffer(usize),
}

impl Display for GltfLoaderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            GltfLoaderError::Gltf(error) => Display::fmt(error, f),
            GltfLoaderError::SparseAccessor(index) => {
                write!(f, "Sparse accessor #{} is not supported", index)
            }
            GltfLoaderError::BadAccessorDataType(index, actual) => {
                write!(f, "Bad data type {:?} for accessor #{}", actual, index)
            }
            GltfLoaderError::BadAccessorDimensions(index, expected, actual) => write!(
                f,
                "Bad dimensions for accessor #{}: expected {:?}, got {:?}",
                index, expected, actual
            ),
            GltfLoaderError::AccessorOutOfBounds(index, end, length) => write!(
                f,
                "Accessor #{} reads up to byte {}, but buffer only has {} bytes",
                index, end, length
            ),
            GltfLoaderError::MissingBuffer(index) => write!(f, "Buffer #{} is not loaded", index),
        }
    }
}

impl Error for GltfLoaderError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            GltfLoaderError::Gltf(error) => Some(error),
            _ => None,
        }
    }
}

impl From<gltf::Error> for GltfLoaderError {
    fn from(value: gltf::Error) -> Self {
        Self::Gltf(value)
    }
}

struct GltfDocumentLoader<'a> {
    document: &'a Document,
    buffers: &'a [gltf::buffer::Data],
}

impl<'a> GltfDocumentLoader<'a> {
    fn new(document: &'a Document, buffers: &'a [gltf::buffer::Data]) -> Self {
        Self { document, buffers }
    }

    #[inline]
    fn check_dimensions(
        accessor: &Accessor,
        dimensions: Dimensions,
    ) -> Result<(), GltfLoaderError> {
        let actual_dimensions = accessor.dimensions();
        if actual_dimensions != dimensions {
            return Err(GltfLoaderError::BadAccessorDimensions(
                accessor.index(),
                dimensions,
                actual_dimensions,
            ));
        }
        Ok(())
    }

    #[inline]
    fn component_size(data_type: DataType) -> usize {
        match data_type {
            DataType::I8 | DataType::U8 => 1,
            DataType::I16 | DataType::U16 => 2,
            DataType::U32 | DataType::F32 => 4,
        }
    }

    #[inline]
    fn component_count(dimensions: Dimensions) -> usize {
        match dimensions {
            Dimensions::Scalar => 1,
            Dimensions::Vec2 => 2,
            Dimensions::Vec3 => 3,
            Dimensions::Vec4 => 4,
            Dimensions::Mat2 => 4,
            Dimensions::Mat3 => 9,
            Dimensions::Mat4 => 16,
        }
    }

    /// Read the tightly packed bytes of an accessor, skipping the stride gaps.
    fn load_accessor(&self, accessor: &Accessor) -> Result<Vec<u8>, GltfLoaderError> {
        if accessor.sparse().is_some() {
            return Err(GltfLoaderError::SparseAccessor(accessor.index()));
        }

        let item_length = Self::component_size(accessor.data_type())
            * Self::component_count(accessor.dimensions());
        let count = accessor.count();

        let view = if let Some(view) = accessor.view() {
            view
        } else {
            return Ok(vec![0; item_length * count]);
        };

        let buffer_index = view.buffer().index();
        let buffer = self
            .buffers
            .get(buffer_index)
            .ok_or(GltfLoaderError::MissingBuffer(buffer_index))?;
        let offset = accessor.offset() + view.offset();
        let stride = view.stride().unwrap_or(item_length);

        let end = if count == 0 {
            offset
        } else {
            offset + stride * (count - 1) + item_length
        };
        if end > buffer.len() || end > view.offset() + view.length() {
            return Err(GltfLoaderError::AccessorOutOfBounds(
                accessor.index(),
                end,
                buffer.len().min(view.offset() + view.length()),
            ));
        }

        let mut result = Vec::with_capacity(item_length * count);
        for item in 0..count {
            let start = offset + item * stride;
            result.extend_from_slice(&buffer[start..start + item_length]);
        }
        Ok(result)
    }

    fn load_accessor_f32(&self, accessor: &Accessor) -> Result<Vec<f32>, GltfLoaderError> {
        if accessor.data_type() != DataType::F32 {
            return Err(GltfLoaderError::BadAccessorDataType(
                accessor.index(),
                accessor.data_type(),
            ));
        }
        let data = self.load_accessor(accessor)?;
        Ok(data
            .chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect())
    }

    /// Float data, or normalized integers widened to float.
    fn load_accessor_normalized(&self, accessor: &Accessor) -> Result<Vec<f32>, GltfLoaderError> {
        let data_type = accessor.data_type();
        if data_type == DataType::F32 {
            return self.load_accessor_f32(accessor);
        }
        if !accessor.normalized() {
            return Err(GltfLoaderError::BadAccessorDataType(
                accessor.index(),
                data_type,
            ));
        }
        let data = self.load_accessor(accessor)?;
        let values = match data_type {
            DataType::I8 => data
                .iter()
                .map(|byte| (*byte as i8 as f32 / i8::MAX as f32).max(-1.0))
                .collect(),
            DataType::U8 => data
                .iter()
                .map(|byte| *byte as f32 / u8::MAX as f32)
                .collect(),
            DataType::I16 => data
                .chunks_exact(2)
                .map(|chunk| {
                    let value = i16::from_le_bytes([chunk[0], chunk[1]]);
                    (value as f32 / i16::MAX as f32).max(-1.0)
                })
                .collect(),
            DataType::U16 => data
                .chunks_exact(2)
                .map(|chunk| u16::from_le_bytes([chunk[0], chunk[1]]) as f32 / u16::MAX as f32)
                .collect(),
            DataType::U32 | DataType::F32 => {
                return Err(GltfLoaderError::BadAccessorDataType(
                    accessor.index(),
                    data_type,
                ))
            }
        };
        Ok(values)
    }

    fn load_node(node: Node) -> NodeAsset {
        let transform = match node.transform() {
            Transform::Matrix { matrix } => {
                NodeTransform::Matrix(MatrixNodeTransform(Mat4::from_cols_array_2d(&matrix)))
            }
            Transform::Decomposed {
                translation,
                rotation,
                scale,
            } => NodeTransform::Decomposed(DecomposedTransform {
                translation: Vec3::from_array(translation),
                rotation: Quat::from_array(rotation),
                scale: Vec3::from_array(scale),
            }),
        };
        NodeAsset {
            name: node.name().map(str::to_string),
            transform,
            children: node.children().map(|child| child.index()).collect(),
            mesh: node.mesh().map(|mesh| mesh.index()),
            skin: node.skin().map(|skin| skin.index()),
        }
    }

    fn load_scene(scene: Scene) -> SceneAsset {
        SceneAsset {
            name: scene.name().map(str::to_string),
            nodes: scene.nodes().map(|node| node.index()).collect(),
        }
    }

    fn load_skin(&self, skin: Skin) -> Result<SkinAsset, GltfLoaderError> {
        let joints: Vec<usize> = skin.joints().map(|joint| joint.index()).collect();
        let inverse_bind_matrices = match skin.inverse_bind_matrices() {
            Some(accessor) => {
                Self::check_dimensions(&accessor, Dimensions::Mat4)?;
                chunk_mat4(&self.load_accessor_f32(&accessor)?)
            }
            None => {
                warn!(
                    "Skin #{} has no inverse bind matrices, using identity",
                    skin.index()
                );
                vec![Mat4::IDENTITY; joints.len()]
            }
        };
        Ok(SkinAsset {
            name: skin.name().map(str::to_string),
            joints,
            inverse_bind_matrices,
            skeleton: skin.skeleton().map(|node| node.index()),
        })
    }

    fn load_animation_sampler(
        &self,
        sampler: &animation::Sampler,
        path: AnimationPath,
    ) -> Result<AnimationSamplerAsset, GltfLoaderError> {
        let input = sampler.input();
        Self::check_dimensions(&input, Dimensions::Scalar)?;
        let times = self.load_accessor_f32(&input)?;

        let output = sampler.output();
        let values = match path {
            AnimationPath::Translation | AnimationPath::Scale => {
                Self::check_dimensions(&output, Dimensions::Vec3)?;
                AnimationValues::Vec3(chunk_vec3(&self.load_accessor_f32(&output)?))
            }
            AnimationPath::Rotation => {
                Self::check_dimensions(&output, Dimensions::Vec4)?;
                AnimationValues::Quat(chunk_vec4(&self.load_accessor_normalized(&output)?))
            }
            AnimationPath::Weights => {
                Self::check_dimensions(&output, Dimensions::Scalar)?;
                AnimationValues::Scalar(self.load_accessor_normalized(&output)?)
            }
        };

        let interpolation = match sampler.interpolation() {
            animation::Interpolation::Step => Interpolation::Step,
            animation::Interpolation::Linear => Interpolation::Linear,
            animation::Interpolation::CubicSpline => Interpolation::CubicSpline,
        };

        Ok(AnimationSamplerAsset {
            times,
            values,
            interpolation,
        })
    }

    fn load_animation(&self, animation: Animation) -> Result<AnimationAsset, GltfLoaderError> {
        let mut channels = Vec::new();
        let mut samplers = Vec::new();
        for channel in animation.channels() {
            let target = channel.target();
            let path = match target.property() {
                Property::Translation => AnimationPath::Translation,
                Property::Rotation => AnimationPath::Rotation,
                Property::Scale => AnimationPath::Scale,
                Property::MorphTargetWeights => AnimationPath::Weights,
            };
            // Samplers are read per channel, since the value layout depends on the target path.
            let sampler = self.load_animation_sampler(&channel.sampler(), path)?;
            channels.push(AnimationChannelAsset {
                target_node: target.node().index(),
                path,
                sampler: samplers.len(),
            });
            samplers.push(sampler);
        }
        Ok(AnimationAsset {
            name: animation.name().map(str::to_string),
            channels,
            samplers,
        })
    }

    fn load(&self) -> Result<ModelAsset, GltfLoaderError> {
        let nodes = self.document.nodes().map(Self::load_node).collect();
        let scenes = self.document.scenes().map(Self::load_scene).collect();
        let skins = self
            .document
            .skins()
            .map(|skin| self.load_skin(skin))
            .collect::<Result<Vec<_>, _>>()?;
        let animations = self
            .document
            .animations()
            .map(|animation| self.load_animation(animation))
            .collect::<Result<Vec<_>, _>>()?;

        if skins.is_empty() && !animations.is_empty() {
            warn!("Model has animations but no skins");
        }

        Ok(ModelAsset {
            name: None,
            nodes,
            scenes,
            default_scene: self.document.default_scene().map(|scene| scene.index()),
            skins,
            animations,
        })
    }
}

fn load_document(
    document: &Document,
    buffers: &[gltf::buffer::Data],
) -> Result<ModelAsset, GltfLoaderError> {
    let model = GltfDocumentLoader::new(document, buffers).load()?;
    info!(
        "Loaded model: {} nodes, {} skins, {} animations",
        model.nodes.len(),
        model.skins.len(),
        model.animations.len()
    );
    Ok(model)
}

/// Load a GLTF or GLB file from the file system.
///
/// External buffers are resolved relative to the file. Images are decoded by
/// `gltf` but not kept.
pub fn load_gltf(path: impl AsRef<Path>) -> Result<ModelAsset, GltfLoaderError> {
    let path = path.as_ref();
    let (document, buffers, _images) = gltf::import(path)?;
    let mut model = load_document(&document, &buffers)?;
    model.name = path
        .file_stem()
        .map(|name| name.to_string_lossy().into_owned());
    Ok(model)
}

/// Load a GLB file, or a GLTF file with only data URIs, from a slice.
pub fn load_gltf_from_slice(buffer: &[u8]) -> Result<ModelAsset, GltfLoaderError> {
    let (document, buffers, _images) = gltf::import_slice(buffer)?;
    load_document(&document, &buffers)
}
