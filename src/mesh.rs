// mesh.rs — inward-facing sphere the equirectangular photo is mapped onto

/// World radius of the panorama sphere. The camera sits at its center.
pub const SPHERE_RADIUS: f32 = 500.0;

/// Fixed tessellation. A sphere has no silhouette edges visible from inside,
/// so this mostly governs UV fidelity near the poles; 60×60 is plenty.
pub const SPHERE_SEGMENTS: usize = 60;

#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
}

#[derive(Debug, Clone)]
pub struct SphereMesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

/// Build a lat/lon sphere wound so its interior side is the front face.
///
/// The photo wraps horizontally exactly once. U runs backwards (1 → 0 as the
/// azimuth grows) because an equirectangular photo is captured facing
/// outward; without the mirror, left and right would be swapped when the
/// image is viewed from inside. V = 0 at the zenith, matching the image's
/// top row.
pub fn build_sphere(radius: f32, lat: usize, lon: usize) -> SphereMesh {
    let mut vertices = Vec::with_capacity((lat + 1) * (lon + 1));
    let mut indices = Vec::with_capacity(lat * lon * 6);

    for i in 0..=lat {
        let theta = std::f32::consts::PI * (i as f32) / (lat as f32);
        let y = radius * theta.cos();
        let sin_t = theta.sin();

        for j in 0..=lon {
            let phi = 2.0 * std::f32::consts::PI * (j as f32) / (lon as f32);

            let x = radius * phi.cos() * sin_t;
            let z = radius * phi.sin() * sin_t;

            let u = 1.0 - (j as f32) / (lon as f32);
            let v = (i as f32) / (lat as f32);

            vertices.push(Vertex {
                position: [x, y, z],
                uv: [u, v],
            });
        }
    }

    for i in 0..lat {
        for j in 0..lon {
            let a = (i * (lon + 1) + j) as u32;
            let b = a + (lon + 1) as u32;

            // Both triangles face the origin; back-face culling then drops
            // the outside of the sphere for free.
            indices.extend_from_slice(&[a, b, a + 1, b, b + 1, a + 1]);
        }
    }

    SphereMesh { vertices, indices }
}
