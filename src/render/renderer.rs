use glam::Mat4;

use crate::config::RendererConfig;
use crate::error::Result;
use crate::mesh::MeshId;
use crate::render::{ConstantRing, InstanceConstants};
use crate::scene::{Node, Scene};

/// How a mesh's triangles are rasterized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FillMode {
    #[default]
    Fill,
    Wireframe,
}

/// The commands a frame's traversal issues.
///
/// Implemented over a wgpu render pass by the scene pass, and by recorders in tests.
pub trait RenderEncoder {
    /// Bind the constants at byte `offset` of region `region` for the next draw.
    fn set_instance_constants(&mut self, region: usize, offset: usize);

    /// Draw every submesh of `mesh`.
    fn draw_mesh(&mut self, mesh: MeshId, fill_mode: FillMode);
}

/// What one call to [`Renderer::draw`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameStats {
    /// Constant region the frame wrote to.
    pub region: usize,
    /// Nodes whose constants were written.
    pub instances: usize,
    /// Meshes drawn.
    pub draws: usize,
    /// Nodes skipped because their slot did not fit in the region.
    pub truncated: usize,
}

/// Walks a scene each frame, packing per-node constants into the ring and
/// issuing draws through a [`RenderEncoder`].
#[derive(Debug)]
pub struct Renderer {
    config: RendererConfig,
    ring: ConstantRing,
}

struct Frame {
    view: Mat4,
    projection: Mat4,
    offset: usize,
    stats: FrameStats,
}

impl Renderer {
    pub fn new(config: RendererConfig) -> Result<Self> {
        let ring = ConstantRing::new(&config)?;
        log::debug!(
            "Renderer: {} regions of {} bytes, stride {}, {} instances per frame",
            ring.region_count(),
            ring.capacity(),
            ring.stride(),
            ring.slot_count()
        );
        Ok(Self { config, ring })
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    pub fn ring(&self) -> &ConstantRing {
        &self.ring
    }

    /// Region written by the most recent frame.
    pub fn frame_index(&self) -> usize {
        self.ring.frame_index()
    }

    /// Encode one frame of `scene` as seen from `point_of_view`.
    ///
    /// Returns `None` and leaves the ring untouched when there is no point of
    /// view or it carries no camera. Otherwise moves to the next region, visits
    /// every node in pre-order giving each one stride of the region, and draws
    /// the nodes that have a mesh.
    pub fn draw(
        &mut self,
        scene: &Scene,
        point_of_view: Option<&Node>,
        aspect_ratio: f32,
        encoder: &mut impl RenderEncoder,
    ) -> Option<FrameStats> {
        let point_of_view = point_of_view?;
        let camera = point_of_view.camera()?;

        let region = self.ring.advance();
        let mut frame = Frame {
            view: point_of_view.world_transform().inverse(),
            projection: camera.projection_matrix(aspect_ratio),
            offset: 0,
            stats: FrameStats {
                region,
                ..Default::default()
            },
        };

        self.draw_node(scene.root_node(), Mat4::IDENTITY, &mut frame, encoder);

        if frame.stats.truncated > 0 {
            log::warn!(
                "Constant region full: skipped {} of {} nodes ({} bytes per region)",
                frame.stats.truncated,
                frame.stats.truncated + frame.stats.instances,
                self.ring.capacity()
            );
        }
        log::trace!("Frame {:?}", frame.stats);
        Some(frame.stats)
    }

    fn draw_node(
        &mut self,
        node: &Node,
        parent_world: Mat4,
        frame: &mut Frame,
        encoder: &mut impl RenderEncoder,
    ) {
        let world = parent_world * node.transform();
        let material = node.material();
        let constants =
            InstanceConstants::new(world, frame.view, frame.projection, material.color);

        if self.ring.write(frame.offset, &constants) {
            frame.stats.instances += 1;
            if let Some(mesh) = node.mesh() {
                let fill_mode = if material.highlighted {
                    FillMode::Wireframe
                } else {
                    FillMode::Fill
                };
                encoder.set_instance_constants(frame.stats.region, frame.offset);
                encoder.draw_mesh(mesh, fill_mode);
                frame.stats.draws += 1;
            }
        } else {
            frame.stats.truncated += 1;
        }
        frame.offset += self.ring.stride();

        for child in node.children() {
            self.draw_node(&child, world, frame, encoder);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::Camera;
    use crate::color::Color;
    use glam::Vec3;

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Command {
        Bind { region: usize, offset: usize },
        Draw { mesh: MeshId, fill_mode: FillMode },
    }

    #[derive(Default)]
    struct Recorder {
        commands: Vec<Command>,
    }

    impl RenderEncoder for Recorder {
        fn set_instance_constants(&mut self, region: usize, offset: usize) {
            self.commands.push(Command::Bind { region, offset });
        }

        fn draw_mesh(&mut self, mesh: MeshId, fill_mode: FillMode) {
            self.commands.push(Command::Draw { mesh, fill_mode });
        }
    }

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    /// root -> a(mesh 0) -> b ; root -> c(mesh 1, highlighted) ; root -> eye(camera)
    fn fixture() -> (Scene, Node) {
        let scene = Scene::new();

        let a = Node::named("a");
        a.set_transform(Mat4::from_translation(Vec3::X));
        a.set_mesh(Some(MeshId(0)));
        a.set_color(Color::RED);
        scene.root_node().add_child_node(&a);

        let b = Node::named("b");
        b.set_transform(Mat4::from_translation(Vec3::Y));
        a.add_child_node(&b);

        let c = Node::named("c");
        c.set_mesh(Some(MeshId(1)));
        c.set_highlighted(true);
        scene.root_node().add_child_node(&c);

        let eye = Node::named("eye");
        eye.set_transform(Mat4::from_translation(Vec3::new(0.0, 0.0, 10.0)));
        eye.set_camera(Some(Camera::new()));
        scene.root_node().add_child_node(&eye);

        (scene, eye)
    }

    #[test]
    fn no_point_of_view_draws_nothing() {
        let (scene, _) = fixture();
        let mut renderer = Renderer::new(RendererConfig::default()).unwrap();
        let before = renderer.frame_index();
        let mut recorder = Recorder::default();

        assert!(renderer.draw(&scene, None, 1.0, &mut recorder).is_none());
        assert!(recorder.commands.is_empty());
        assert_eq!(renderer.frame_index(), before);
    }

    #[test]
    fn point_of_view_without_camera_draws_nothing() {
        let (scene, _) = fixture();
        let a = scene.find_node("a").unwrap();
        let mut renderer = Renderer::new(RendererConfig::default()).unwrap();
        let before = renderer.frame_index();
        let mut recorder = Recorder::default();

        assert!(renderer.draw(&scene, Some(&a), 1.0, &mut recorder).is_none());
        assert!(recorder.commands.is_empty());
        assert_eq!(renderer.frame_index(), before);
    }

    #[test]
    fn every_node_takes_one_stride() {
        let (scene, eye) = fixture();
        let mut renderer = Renderer::new(RendererConfig::default()).unwrap();
        let mut recorder = Recorder::default();

        let stats = renderer.draw(&scene, Some(&eye), 1.0, &mut recorder).unwrap();

        // Pre-order: root 0, a 256, b 512, c 768, eye 1024.
        assert_eq!(
            recorder.commands,
            vec![
                Command::Bind { region: 0, offset: 256 },
                Command::Draw { mesh: MeshId(0), fill_mode: FillMode::Fill },
                Command::Bind { region: 0, offset: 768 },
                Command::Draw { mesh: MeshId(1), fill_mode: FillMode::Wireframe },
            ]
        );
        assert_eq!(
            stats,
            FrameStats { region: 0, instances: 5, draws: 2, truncated: 0 }
        );
    }

    #[test]
    fn constants_use_composed_world_transform() {
        let (scene, eye) = fixture();
        let mut renderer = Renderer::new(RendererConfig::default()).unwrap();
        renderer.draw(&scene, Some(&eye), 1.5, &mut Recorder::default());

        let view = Mat4::from_translation(Vec3::new(0.0, 0.0, -10.0));
        let projection = Camera::new().projection_matrix(1.5);
        let world_b = Mat4::from_translation(Vec3::new(1.0, 1.0, 0.0));

        let b = renderer.ring().read(0, 512).unwrap();
        let mvp = Mat4::from_cols_array_2d(&b.model_view_projection);
        assert!(mvp.abs_diff_eq(projection * view * world_b, 1e-5));

        let a = renderer.ring().read(0, 256).unwrap();
        assert_eq!(a.color, Color::RED.to_array());
    }

    #[test]
    fn frames_rotate_through_regions() {
        let (scene, eye) = fixture();
        let mut renderer = Renderer::new(RendererConfig::new().frames_in_flight(2)).unwrap();

        let regions: Vec<usize> = (0..5)
            .map(|_| {
                renderer
                    .draw(&scene, Some(&eye), 1.0, &mut Recorder::default())
                    .unwrap()
                    .region
            })
            .collect();
        assert_eq!(regions, vec![0, 1, 0, 1, 0]);
    }

    #[test]
    fn nodes_past_capacity_are_truncated() {
        init_logger();
        let (scene, eye) = fixture();
        // Room for root, a and b only.
        let config = RendererConfig::new().constant_buffer_length(3 * 256);
        let mut renderer = Renderer::new(config).unwrap();
        let mut recorder = Recorder::default();

        let stats = renderer.draw(&scene, Some(&eye), 1.0, &mut recorder).unwrap();

        assert_eq!(stats.instances, 3);
        assert_eq!(stats.truncated, 2);
        assert_eq!(stats.draws, 1);
        assert_eq!(
            recorder.commands,
            vec![
                Command::Bind { region: 0, offset: 256 },
                Command::Draw { mesh: MeshId(0), fill_mode: FillMode::Fill },
            ]
        );
    }

    #[test]
    fn invalid_config_is_rejected() {
        assert!(Renderer::new(RendererConfig::new().frames_in_flight(0)).is_err());
    }
}
