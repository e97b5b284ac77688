use glam::Mat4;

/// GLTF loader with `gltf` crate.
#[cfg(feature = "gltf")]
pub mod gltf;

#[inline]
fn chunk_vec3(data: &[f32]) -> Vec<[f32; 3]> {
    data.chunks_exact(3)
        .map(|item| [item[0], item[1], item[2]])
        .collect()
}

#[inline]
fn chunk_vec4(data: &[f32]) -> Vec<[f32; 4]> {
    data.chunks_exact(4)
        .map(|item| [item[0], item[1], item[2], item[3]])
        .collect()
}

#[inline]
fn chunk_mat4(data: &[f32]) -> Vec<Mat4> {
    data.chunks_exact(16).map(Mat4::from_cols_slice).collect()
}

#[cfg(test)]
mod test {
    use glam::Mat4;

    use super::{chunk_mat4, chunk_vec3};

    #[test]
    fn test_chunk_drops_partial_items() {
        let data = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(chunk_vec3(&data), vec![[1.0, 2.0, 3.0]]);
    }

    #[test]
    fn test_chunk_mat4_is_column_major() {
        let translation = Mat4::from_translation((1.0, 2.0, 3.0).into());
        let data = translation.to_cols_array();
        assert_eq!(chunk_mat4(&data), vec![translation]);
    }
}
