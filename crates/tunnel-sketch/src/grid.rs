//! Cube-of-cubes geometry and the tunnel frame layout.

use glam::{Mat4, Vec3};
use tunnel_engine::render::CubeInstance;

/// Integer position of a cube inside the grid.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct GridCoord {
    pub x: u32,
    pub y: u32,
    pub z: u32,
}

impl GridCoord {
    pub const fn new(x: u32, y: u32, z: u32) -> Self {
        Self { x, y, z }
    }
}

/// True when any coordinate lies on the outer shell of an `n`-sized grid.
pub fn is_surface(c: GridCoord, n: u32) -> bool {
    let last = n.saturating_sub(1);
    [c.x, c.y, c.z].iter().any(|&v| v == 0 || v == last)
}

/// Shell cells in x-major, then y, then z order.
pub fn surface_cells(n: u32) -> impl Iterator<Item = GridCoord> {
    (0..n)
        .flat_map(move |x| (0..n).flat_map(move |y| (0..n).map(move |z| GridCoord::new(x, y, z))))
        .filter(move |&c| is_surface(c, n))
}

/// Center cubes of the six outer faces: −X, +X, −Y, +Y, −Z, +Z.
pub fn face_centers(n: u32) -> [GridCoord; 6] {
    let mid = n / 2;
    let last = n.saturating_sub(1);
    [
        GridCoord::new(0, mid, mid),
        GridCoord::new(last, mid, mid),
        GridCoord::new(mid, 0, mid),
        GridCoord::new(mid, last, mid),
        GridCoord::new(mid, mid, 0),
        GridCoord::new(mid, mid, last),
    ]
}

/// Face center to label assignment.
///
/// Face `i` (in [`face_centers`] order) gets label `i mod label_count`.
/// Labels that no face uses are never uploaded; `layers` lists the used label
/// indices in first-use order and `layer` returns a face's position in it.
#[derive(Debug, Clone)]
pub struct FaceLabelMap {
    faces: [GridCoord; 6],
    labels: [usize; 6],
    layers: Vec<usize>,
}

impl FaceLabelMap {
    pub fn new(grid_size: u32, label_count: usize) -> Self {
        let faces = face_centers(grid_size);
        let count = label_count.max(1);
        let labels: [usize; 6] = std::array::from_fn(|i| i % count);

        let mut layers = Vec::with_capacity(6);
        for &label in &labels {
            if !layers.contains(&label) {
                layers.push(label);
            }
        }

        Self { faces, labels, layers }
    }

    /// Label index for a face center, `None` for any other cell.
    pub fn label(&self, c: GridCoord) -> Option<usize> {
        self.faces.iter().position(|&f| f == c).map(|i| self.labels[i])
    }

    /// Texture layer for a face center.
    pub fn layer(&self, c: GridCoord) -> Option<u32> {
        let label = self.label(c)?;
        self.layers.iter().position(|&l| l == label).map(|p| p as u32)
    }

    /// Label indices that need a texture layer, in layer order.
    pub fn layers(&self) -> &[usize] {
        &self.layers
    }
}

/// Size-dependent layout constants.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct GridLayout {
    pub grid_size: u32,
    pub cube_size: f32,
    pub spacing: f32,
    pub offset: f32,
    pub cycle_length: f32,
}

impl GridLayout {
    pub fn new(grid_size: u32, min_dim: f32) -> Self {
        let n = grid_size as f32;
        let cube_size = min_dim / (n * 1.5);
        let spacing = cube_size * 1.2;
        Self {
            grid_size,
            cube_size,
            spacing,
            offset: (n - 1.0) * spacing / 2.0,
            cycle_length: spacing * n * 0.8,
        }
    }

    /// Wraps an accumulated zoom value into `[0, cycle_length)`.
    pub fn wrap_zoom(&self, zoom: f32) -> f32 {
        if self.cycle_length > 0.0 {
            zoom.rem_euclid(self.cycle_length)
        } else {
            0.0
        }
    }

    /// Forward offset of tunnel copy `k`.
    pub fn frame_depth(&self, zoom: f32, k: u32) -> f32 {
        self.wrap_zoom(zoom) + k as f32 * self.cycle_length
    }

    pub fn frame_scale(k: u32) -> f32 {
        1.0 + 0.5 * k as f32
    }

    /// Cell center relative to the grid center.
    pub fn cell_position(&self, c: GridCoord) -> Vec3 {
        Vec3::new(c.x as f32, c.y as f32, c.z as f32) * self.spacing - Vec3::splat(self.offset)
    }

    pub fn cube_model(&self, zoom: f32, k: u32, c: GridCoord) -> Mat4 {
        Mat4::from_translation(Vec3::new(0.0, 0.0, self.frame_depth(zoom, k)))
            * Mat4::from_scale(Vec3::splat(Self::frame_scale(k)))
            * Mat4::from_translation(self.cell_position(c))
            * Mat4::from_scale(Vec3::splat(self.cube_size))
    }
}

/// Builds cube instances for `frames` tunnel copies.
///
/// Every face center in every copy carries its mapped label layer; all other
/// shell cells are drawn as wireframes.
pub fn build_instances(
    layout: &GridLayout,
    map: &FaceLabelMap,
    zoom: f32,
    frames: u32,
) -> Vec<CubeInstance> {
    let cells: Vec<GridCoord> = surface_cells(layout.grid_size).collect();
    let mut out = Vec::with_capacity(cells.len() * frames as usize);

    for k in 0..frames {
        for &c in &cells {
            let model = layout.cube_model(zoom, k, c);
            out.push(match map.layer(c) {
                Some(layer) => CubeInstance::textured(model, layer),
                None => CubeInstance::wireframe(model),
            });
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_five_has_98_surface_cells() {
        assert_eq!(surface_cells(5).count(), 98);
        assert_eq!(surface_cells(3).count(), 26);
    }

    #[test]
    fn surface_cells_are_x_major() {
        let first: Vec<GridCoord> = surface_cells(3).take(3).collect();
        assert_eq!(
            first,
            vec![GridCoord::new(0, 0, 0), GridCoord::new(0, 0, 1), GridCoord::new(0, 0, 2)]
        );
    }

    #[test]
    fn face_centers_are_on_the_surface() {
        for n in [3, 5, 7] {
            for c in face_centers(n) {
                assert!(is_surface(c, n), "{c:?} in {n}");
            }
        }
        assert!(!is_surface(GridCoord::new(2, 2, 2), 5));
    }

    #[test]
    fn mapping_is_cyclic() {
        let map = FaceLabelMap::new(5, 4);
        let faces = face_centers(5);
        let labels: Vec<usize> = faces.iter().filter_map(|&f| map.label(f)).collect();
        assert_eq!(labels, vec![0, 1, 2, 3, 0, 1]);
        assert_eq!(map.layers(), &[0, 1, 2, 3]);
        assert_eq!(map.layer(faces[4]), Some(0));
        assert_eq!(map.label(GridCoord::new(0, 0, 0)), None);
    }

    #[test]
    fn only_used_labels_get_layers() {
        let map = FaceLabelMap::new(5, 17);
        assert_eq!(map.layers(), &[0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn six_textured_cubes_per_frame() {
        let layout = GridLayout::new(5, 720.0);
        let map = FaceLabelMap::new(5, 17);
        let cubes = build_instances(&layout, &map, 0.0, 4);

        assert_eq!(cubes.len(), 98 * 4);
        for frame in cubes.chunks(98) {
            assert_eq!(frame.iter().filter(|c| c.is_textured()).count(), 6);
        }
    }

    #[test]
    fn textured_cubes_sit_on_face_centers() {
        let layout = GridLayout::new(5, 720.0);
        let map = FaceLabelMap::new(5, 17);
        let cubes = build_instances(&layout, &map, 0.0, 1);
        let centers: Vec<Vec3> = face_centers(5)
            .iter()
            .map(|&c| layout.cube_model(0.0, 0, c).transform_point3(Vec3::ZERO))
            .collect();

        for cube in cubes.iter().filter(|c| c.is_textured()) {
            let p = cube.model().transform_point3(Vec3::ZERO);
            assert!(centers.iter().any(|c| c.distance(p) < 1e-3));
        }
    }

    #[test]
    fn every_face_shows_its_cyclic_label() {
        let layout = GridLayout::new(5, 720.0);
        let frames = 3;

        for n in [1usize, 2, 4, 6, 17] {
            let map = FaceLabelMap::new(5, n);
            let cubes = build_instances(&layout, &map, 37.0, frames);

            for (k, frame) in cubes.chunks(98).enumerate() {
                assert_eq!(frame.iter().filter(|c| c.is_textured()).count(), 6, "n={n}");

                for (i, &face) in face_centers(5).iter().enumerate() {
                    let pos = layout.cube_model(37.0, k as u32, face).transform_point3(Vec3::ZERO);
                    let cube = frame
                        .iter()
                        .find(|c| c.model().transform_point3(Vec3::ZERO).distance(pos) < 1e-3)
                        .expect("face center cube");
                    let layer = cube.layer().expect("textured face");
                    let label = map.layers()[layer as usize];
                    assert_eq!(label, i % n, "n={n} frame={k} face={i}");
                }
            }

            let mut shown: Vec<usize> = cubes
                .iter()
                .filter_map(|c| c.layer())
                .map(|layer| map.layers()[layer as usize])
                .collect();
            shown.sort_unstable();
            shown.dedup();
            assert_eq!(shown.len(), n.min(6), "n={n}");
        }
    }

    #[test]
    fn layout_constants() {
        let layout = GridLayout::new(5, 750.0);
        assert!((layout.cube_size - 100.0).abs() < 1e-4);
        assert!((layout.spacing - 120.0).abs() < 1e-4);
        assert!((layout.offset - 240.0).abs() < 1e-4);
        assert!((layout.cycle_length - 480.0).abs() < 1e-3);
    }

    #[test]
    fn frame_depth_wraps_and_stacks() {
        let layout = GridLayout::new(5, 750.0);
        assert!((layout.frame_depth(500.0, 0) - 20.0).abs() < 1e-3);
        assert!((layout.frame_depth(500.0, 2) - 980.0).abs() < 1e-3);
        assert_eq!(GridLayout::frame_scale(0), 1.0);
        assert_eq!(GridLayout::frame_scale(3), 2.5);
    }

    #[test]
    fn grid_is_centered_on_origin() {
        let layout = GridLayout::new(5, 750.0);
        let mid = layout.cell_position(GridCoord::new(2, 2, 2));
        assert!(mid.length() < 1e-4);
    }
}
