//! glTF / GLB parsing into [`Prefab`] data.
//!
//! The loader never touches a `Scene`. It resolves the raw bytes, reads
//! geometry and shape key displacements into shared [`Geometry`] resources
//! (deduplicated by content identity) and converts animations into clips.
//! Instantiation happens later, per consumer, in `Scene::instantiate`.

use std::sync::Arc;

use base64::Engine as _;
use glam::{Mat4, Quat, Vec3, Vec4};
use serde_json::Value;
use uuid::Uuid;

use crate::animation::{
    AnimationClip, InterpolationMode, KeyframeTrack, MorphWeightData, TargetPath, Track, TrackData,
    TrackMeta,
};
use crate::assets::io::{AssetReaderVariant, Locator};
use crate::assets::prefab::{Prefab, PrefabMesh, PrefabNode};
use crate::assets::server::GeometryHandle;
use crate::assets::storage::AssetStorage;
use crate::errors::{Result, ReviewError};
use crate::resources::{Geometry, Material, Side};

/// Parses the model behind `locator` into a prefab.
///
/// IO stays on the calling task; geometry extraction runs on the blocking
/// pool. Geometries land in `geometries` keyed by a content-derived UUID,
/// so re-loading the same source reuses the stored data instead of growing
/// the pool.
pub(crate) async fn load_prefab(
    locator: &Locator,
    geometries: &Arc<AssetStorage<GeometryHandle, Geometry>>,
) -> Result<Prefab> {
    let (bytes, reader) = resolve_source(locator).await?;

    let gltf = gltf::Gltf::from_slice_without_validation(&bytes)?;

    let required: Vec<&str> = gltf.extensions_required().collect();
    if !required.is_empty() {
        log::warn!("model '{locator}' requires unsupported glTF extensions: {required:?}");
    }

    let buffers = load_buffers(&gltf, reader.as_ref()).await?;

    let locator = locator.clone();
    let geometries = Arc::clone(geometries);
    tokio::task::spawn_blocking(move || build_prefab(&locator, &gltf, &buffers, &geometries)).await?
}

fn build_prefab(
    locator: &Locator,
    gltf: &gltf::Gltf,
    buffers: &[Vec<u8>],
    geometries: &AssetStorage<GeometryHandle, Geometry>,
) -> Result<Prefab> {
    let mut prefab = Prefab::new(locator.label());

    // Pass 1: nodes and transforms, indices matching the glTF document
    for node in gltf.nodes() {
        let name = node
            .name()
            .map_or_else(|| format!("Node_{}", node.index()), str::to_string);
        let mut prefab_node = PrefabNode::new(name);

        match node.transform() {
            gltf::scene::Transform::Matrix { matrix } => {
                let mat = Mat4::from_cols_array_2d(&matrix);
                prefab_node
                    .transform
                    .apply_local_matrix(glam::Affine3A::from_mat4(mat));
            }
            gltf::scene::Transform::Decomposed {
                translation,
                rotation,
                scale,
            } => {
                prefab_node.transform.position = Vec3::from_array(translation);
                prefab_node.transform.rotation = Quat::from_array(rotation);
                prefab_node.transform.scale = Vec3::from_array(scale);
            }
        }

        prefab_node.children_indices = node.children().map(|c| c.index()).collect();
        prefab.nodes.push(prefab_node);
    }

    // Roots come from the default scene when one exists
    if let Some(scene) = gltf.default_scene().or_else(|| gltf.scenes().next()) {
        prefab.root_indices = scene.nodes().map(|n| n.index()).collect();
    } else {
        let mut is_child = vec![false; prefab.nodes.len()];
        for node in &prefab.nodes {
            for &child in &node.children_indices {
                if let Some(flag) = is_child.get_mut(child) {
                    *flag = true;
                }
            }
        }
        prefab.root_indices = (0..prefab.nodes.len()).filter(|&i| !is_child[i]).collect();
    }

    // Pass 2: meshes. A multi-primitive mesh becomes one child node per
    // primitive, mirroring how a single glTF node fans out to submeshes.
    let mut extra_nodes: Vec<(usize, PrefabNode)> = Vec::new();

    for node in gltf.nodes() {
        let Some(mesh) = node.mesh() else {
            continue;
        };
        let target_names = morph_target_names(&mesh);
        let primitives: Vec<_> = mesh.primitives().collect();

        match primitives.len() {
            0 => {}
            1 => {
                let prefab_mesh = build_prefab_mesh(
                    locator,
                    &mesh,
                    &primitives[0],
                    &buffers,
                    &target_names,
                    geometries,
                )?;
                prefab.nodes[node.index()].mesh = Some(prefab_mesh);
            }
            _ => {
                let base_name = prefab.nodes[node.index()].name.clone();
                for (pi, primitive) in primitives.iter().enumerate() {
                    let prefab_mesh = build_prefab_mesh(
                        locator,
                        &mesh,
                        primitive,
                        &buffers,
                        &target_names,
                        geometries,
                    )?;
                    let mut child = PrefabNode::new(format!("{base_name}_{pi}"));
                    child.mesh = Some(prefab_mesh);
                    extra_nodes.push((node.index(), child));
                }
            }
        }
    }

    for (parent_index, child) in extra_nodes {
        let child_index = prefab.nodes.len();
        prefab.nodes.push(child);
        prefab.nodes[parent_index].children_indices.push(child_index);
    }

    prefab.animations = load_animations(&gltf, &buffers);

    log::debug!(
        "loaded '{}': {} nodes, {} clips, {} shape key channels",
        prefab.name,
        prefab.nodes.len(),
        prefab.animations.len(),
        prefab.max_morph_target_count()
    );

    Ok(prefab)
}

/// Reads the top-level model bytes and keeps a reader rooted next to the
/// source for resolving relative buffer URIs.
async fn resolve_source(locator: &Locator) -> Result<(Vec<u8>, Option<AssetReaderVariant>)> {
    match locator {
        Locator::Url(url) => {
            let reader = AssetReaderVariant::from_source(url)?;
            let filename = AssetReaderVariant::source_filename(url).to_string();
            let bytes = reader.read_bytes(&filename).await?;
            Ok((bytes, Some(reader)))
        }
        Locator::Path(path) => {
            let source = path.to_string_lossy();
            let reader = AssetReaderVariant::from_source(&source)?;
            let filename = AssetReaderVariant::source_filename(&source).to_string();
            let bytes = reader.read_bytes(&filename).await?;
            Ok((bytes, Some(reader)))
        }
        Locator::Bytes { data, .. } => Ok((data.to_vec(), None)),
    }
}

async fn load_buffers(
    gltf: &gltf::Gltf,
    reader: Option<&AssetReaderVariant>,
) -> Result<Vec<Vec<u8>>> {
    let mut buffer_data = Vec::new();
    for buffer in gltf.buffers() {
        let data = match buffer.source() {
            gltf::buffer::Source::Bin => gltf
                .blob
                .as_deref()
                .map(<[u8]>::to_vec)
                .ok_or_else(|| ReviewError::GltfError("missing GLB binary chunk".to_string()))?,
            gltf::buffer::Source::Uri(uri) => {
                if let Some(rest) = uri.strip_prefix("data:") {
                    decode_data_uri(rest)?
                } else if let Some(reader) = reader {
                    reader.read_bytes(uri).await?
                } else {
                    return Err(ReviewError::AssetNotFound(format!(
                        "external buffer '{uri}' is not reachable from an in-memory source"
                    )));
                }
            }
        };
        buffer_data.push(data);
    }
    Ok(buffer_data)
}

fn decode_data_uri(rest: &str) -> Result<Vec<u8>> {
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| ReviewError::DataUriError("missing ',' separator".to_string()))?;
    if meta.ends_with(";base64") {
        Ok(base64::engine::general_purpose::STANDARD.decode(payload)?)
    } else {
        Err(ReviewError::DataUriError(format!(
            "unsupported data URI encoding '{meta}'"
        )))
    }
}

/// Shape key channel names from the mesh `extras.targetNames` convention.
/// Missing or malformed extras just yield unnamed channels.
fn morph_target_names(mesh: &gltf::Mesh) -> Vec<String> {
    let parsed: Option<Value> = mesh
        .extras()
        .as_ref()
        .and_then(|raw| serde_json::from_str(raw.get()).ok());

    parsed
        .as_ref()
        .and_then(|value| value.get("targetNames"))
        .and_then(Value::as_array)
        .map(|names| {
            names
                .iter()
                .filter_map(|n| n.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

fn build_prefab_mesh(
    locator: &Locator,
    mesh: &gltf::Mesh,
    primitive: &gltf::Primitive,
    buffers: &[Vec<u8>],
    target_names: &[String],
    geometries: &AssetStorage<GeometryHandle, Geometry>,
) -> Result<PrefabMesh> {
    let geometry =
        load_primitive_geometry(locator, mesh, primitive, buffers, target_names, geometries)?;
    let material = convert_material(&primitive.material());

    let name = mesh
        .name()
        .map_or_else(|| format!("Mesh_{}", mesh.index()), str::to_string);

    Ok(PrefabMesh {
        name,
        geometry,
        material,
    })
}

/// Maps glTF PBR settings onto the flat material template. Base color
/// alpha folds into `opacity`; blend mode maps to the transparent flag.
fn convert_material(material: &gltf::Material) -> Material {
    let pbr = material.pbr_metallic_roughness();
    let base = pbr.base_color_factor();

    let mut out = Material::new(Vec4::new(base[0], base[1], base[2], 1.0));
    out.name = material.name().map(str::to_string);
    out.opacity = base[3];
    out.transparent = matches!(material.alpha_mode(), gltf::material::AlphaMode::Blend);
    out.side = if material.double_sided() {
        Side::Double
    } else {
        Side::Front
    };
    out
}

fn load_primitive_geometry(
    locator: &Locator,
    mesh: &gltf::Mesh,
    primitive: &gltf::Primitive,
    buffers: &[Vec<u8>],
    target_names: &[String],
    geometries: &AssetStorage<GeometryHandle, Geometry>,
) -> Result<Arc<Geometry>> {
    // Content identity: same source, same primitive -> same stored geometry
    let dedup_id = Uuid::new_v5(
        &Uuid::NAMESPACE_URL,
        format!(
            "{}#mesh{}/primitive{}",
            locator.cache_key(),
            mesh.index(),
            primitive.index()
        )
        .as_bytes(),
    );

    if let Some(existing) = geometries.get_by_uuid(&dedup_id) {
        return Ok(existing);
    }

    let mut geometry = Geometry::new();
    let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(Vec::as_slice));

    geometry.positions = reader
        .read_positions()
        .map(|iter| iter.map(Vec3::from_array).collect())
        .unwrap_or_default();

    geometry.normals = reader
        .read_normals()
        .map(|iter| iter.map(Vec3::from_array).collect())
        .unwrap_or_default();

    if let Some(indices) = reader.read_indices() {
        geometry.indices = indices.into_u32().collect();
    }

    let get_buffer_data = |buffer: gltf::Buffer| buffers.get(buffer.index()).map(Vec::as_slice);

    for target in primitive.morph_targets() {
        if let Some(accessor) = target.positions()
            && let Some(iter) = gltf::accessor::Iter::<[f32; 3]>::new(accessor, get_buffer_data)
        {
            geometry.morph_positions.push(iter.map(Vec3::from_array).collect());
        }

        if let Some(accessor) = target.normals()
            && let Some(iter) = gltf::accessor::Iter::<[f32; 3]>::new(accessor, get_buffer_data)
        {
            geometry.morph_normals.push(iter.map(Vec3::from_array).collect());
        }
    }

    geometry.morph_target_names = target_names.to_vec();

    let handle = geometries.add_with_uuid(dedup_id, geometry);
    geometries
        .get(handle)
        .ok_or_else(|| ReviewError::AssetNotFound("geometry storage entry".to_string()))
}

/// glTF mandates one output value per keyframe, or a tangent triplet per
/// keyframe for cubic-spline samplers. Channels that break this cannot be
/// sampled safely and are dropped.
fn track_lengths_match(
    times: &[f32],
    value_count: usize,
    interpolation: InterpolationMode,
) -> bool {
    let expected = match interpolation {
        InterpolationMode::CubicSpline => times.len() * 3,
        _ => times.len(),
    };
    !times.is_empty() && value_count == expected
}

fn load_animations(gltf: &gltf::Gltf, buffers: &[Vec<u8>]) -> Vec<Arc<AnimationClip>> {
    let mut animations = Vec::new();

    for anim in gltf.animations() {
        let mut tracks = Vec::new();

        for channel in anim.channels() {
            let reader = channel.reader(|buffer| buffers.get(buffer.index()).map(Vec::as_slice));
            let target = channel.target();
            let gltf_node = target.node();

            let node_name = gltf_node
                .name()
                .map_or_else(|| format!("Node_{}", gltf_node.index()), str::to_string);

            // A channel with unreadable data degrades to a missing track,
            // never to a load failure
            let Some(inputs) = reader.read_inputs() else {
                log::warn!("animation channel for '{node_name}' has no readable input");
                continue;
            };
            let times: Vec<f32> = inputs.collect();

            let Some(outputs) = reader.read_outputs() else {
                log::warn!("animation channel for '{node_name}' has no readable output");
                continue;
            };

            let interpolation = match channel.sampler().interpolation() {
                gltf::animation::Interpolation::Linear => InterpolationMode::Linear,
                gltf::animation::Interpolation::Step => InterpolationMode::Step,
                gltf::animation::Interpolation::CubicSpline => InterpolationMode::CubicSpline,
            };

            let track = match target.property() {
                gltf::animation::Property::Translation => {
                    let gltf::animation::util::ReadOutputs::Translations(iter) = outputs else {
                        continue;
                    };
                    let values: Vec<Vec3> = iter.map(Vec3::from_array).collect();
                    if !track_lengths_match(&times, values.len(), interpolation) {
                        log::warn!("mismatched translation keyframes for '{node_name}'");
                        continue;
                    }
                    Track {
                        meta: TrackMeta {
                            node_name,
                            target: TargetPath::Translation,
                        },
                        data: TrackData::Vector3(KeyframeTrack::new(times, values, interpolation)),
                    }
                }
                gltf::animation::Property::Rotation => {
                    let gltf::animation::util::ReadOutputs::Rotations(iter) = outputs else {
                        continue;
                    };
                    let values: Vec<Quat> = iter.into_f32().map(Quat::from_array).collect();
                    if !track_lengths_match(&times, values.len(), interpolation) {
                        log::warn!("mismatched rotation keyframes for '{node_name}'");
                        continue;
                    }
                    Track {
                        meta: TrackMeta {
                            node_name,
                            target: TargetPath::Rotation,
                        },
                        data: TrackData::Quaternion(KeyframeTrack::new(
                            times,
                            values,
                            interpolation,
                        )),
                    }
                }
                gltf::animation::Property::Scale => {
                    let gltf::animation::util::ReadOutputs::Scales(iter) = outputs else {
                        continue;
                    };
                    let values: Vec<Vec3> = iter.map(Vec3::from_array).collect();
                    if !track_lengths_match(&times, values.len(), interpolation) {
                        log::warn!("mismatched scale keyframes for '{node_name}'");
                        continue;
                    }
                    Track {
                        meta: TrackMeta {
                            node_name,
                            target: TargetPath::Scale,
                        },
                        data: TrackData::Vector3(KeyframeTrack::new(times, values, interpolation)),
                    }
                }
                gltf::animation::Property::MorphTargetWeights => {
                    let gltf::animation::util::ReadOutputs::MorphTargetWeights(iter) = outputs
                    else {
                        continue;
                    };
                    let flat: Vec<f32> = iter.into_f32().collect();

                    // Cubic-spline samplers pack a tangent triplet per frame,
                    // like every other target path
                    let frame_count = match interpolation {
                        InterpolationMode::CubicSpline => times.len() * 3,
                        _ => times.len(),
                    };
                    let weights_per_frame = if frame_count == 0 {
                        0
                    } else {
                        flat.len() / frame_count
                    };
                    if weights_per_frame == 0 || flat.len() != weights_per_frame * frame_count {
                        log::warn!("mismatched morph weight keyframes for '{node_name}'");
                        continue;
                    }

                    let frames: Vec<MorphWeightData> = flat
                        .chunks(weights_per_frame)
                        .map(MorphWeightData::from_slice)
                        .collect();

                    Track {
                        meta: TrackMeta {
                            node_name,
                            target: TargetPath::Weights,
                        },
                        data: TrackData::MorphWeights(KeyframeTrack::new(
                            times,
                            frames,
                            interpolation,
                        )),
                    }
                }
            };

            tracks.push(track);
        }

        let clip = AnimationClip::new(anim.name().unwrap_or("anim").to_string(), tracks);
        animations.push(Arc::new(clip));
    }

    animations
}
