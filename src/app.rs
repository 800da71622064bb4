use std::sync::Arc;

use glam::{Mat4, Vec2, Vec3};
use winit::application::ApplicationHandler;
use winit::event::{MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::KeyCode;
use winit::window::{Window, WindowAttributes, WindowId};

use crate::camera::Camera;
use crate::color::Color;
use crate::config::ViewerConfig;
use crate::error::{Result, SceneError};
use crate::gpu::GpuContext;
use crate::input::Input;
use crate::mesh::{Mesh, MeshData, MeshId, MeshLibrary};
use crate::picking::{BoundingSphere, HitResult, Ray};
use crate::render::ScenePass;
use crate::scene::{Node, Scene};

const SPHERE_SEGMENTS: u32 = 20;

/// Hue step between neighbouring spheres; the golden ratio keeps hues spread out.
const HUE_STEP: f32 = 0.618_034;

/// Open the viewer with default settings and block until its window closes.
///
/// Left-click a sphere to toggle its wireframe highlight. Escape quits.
pub fn run() -> Result<()> {
    run_with_config(ViewerConfig::default())
}

/// Open the viewer with custom settings.
///
/// # Example
/// ```no_run
/// use scenepick::{ViewerConfig, run_with_config};
///
/// run_with_config(ViewerConfig::new().title("Picking").grid_side_count(7))?;
/// # Ok::<(), scenepick::SceneError>(())
/// ```
pub fn run_with_config(config: ViewerConfig) -> Result<()> {
    config.renderer.validate()?;

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = ViewerApp::Pending {
        config,
        error: None,
    };
    event_loop.run_app(&mut app)?;

    match app {
        ViewerApp::Pending {
            error: Some(error), ..
        } => Err(error),
        _ => Ok(()),
    }
}

enum ViewerApp {
    Pending {
        config: ViewerConfig,
        /// Set when setup failed and the loop was asked to exit.
        error: Option<SceneError>,
    },
    Running(Box<Viewer>),
}

struct Viewer {
    window: Arc<Window>,
    gpu: GpuContext,
    scene_pass: ScenePass,
    meshes: MeshLibrary<Mesh>,
    scene: Scene,
    point_of_view: Node,
    input: Input,
    camera_angle: f32,
    camera_distance: f32,
    camera_spin: f32,
}

impl Viewer {
    fn new(event_loop: &ActiveEventLoop, config: &ViewerConfig) -> Result<Self> {
        let window_attrs = WindowAttributes::default()
            .with_title(&config.title)
            .with_inner_size(winit::dpi::LogicalSize::new(config.width, config.height));

        let window = Arc::new(event_loop.create_window(window_attrs)?);
        let gpu = GpuContext::new(window.clone())?;
        let scene_pass = ScenePass::new(&gpu, config.renderer.clone())?;

        let mut meshes = MeshLibrary::new();
        let sphere = meshes.add_mesh(Mesh::from_data(
            &gpu,
            &MeshData::sphere(config.sphere_radius, SPHERE_SEGMENTS, SPHERE_SEGMENTS),
        ));

        let (scene, point_of_view) = build_sphere_grid(config, sphere);
        log::info!(
            "Built scene with {} nodes ({}x{} grid)",
            scene.node_count(),
            config.grid_side_count,
            config.grid_side_count
        );

        Ok(Self {
            window,
            gpu,
            scene_pass,
            meshes,
            scene,
            point_of_view,
            input: Input::new(),
            camera_angle: 0.0,
            camera_distance: config.camera_distance,
            camera_spin: config.camera_spin,
        })
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        if self.input.key_pressed(KeyCode::Escape) {
            event_loop.exit();
            return;
        }

        if self.input.mouse_pressed(MouseButton::Left) {
            let viewport = Vec2::new(self.gpu.width() as f32, self.gpu.height() as f32);
            if let Some(hit) = pick(
                &self.scene,
                &self.point_of_view,
                self.input.cursor_position(),
                viewport,
            ) {
                hit.node.toggle_highlighted();
                log::info!("Hit {:?} at {}", hit.node, hit.intersection_point());
            } else {
                log::debug!("Click at {} hit nothing", self.input.cursor_position());
            }
        }

        self.camera_angle += self.camera_spin;
        self.point_of_view
            .set_transform(orbit_transform(self.camera_angle, self.camera_distance));

        self.scene_pass.render_frame(
            &self.gpu,
            &self.scene,
            Some(&self.point_of_view),
            &self.meshes,
        );

        self.input.begin_frame();
        self.window.request_redraw();
    }
}

impl ApplicationHandler for ViewerApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let ViewerApp::Pending { config, error } = self else {
            return;
        };
        match Viewer::new(event_loop, config) {
            Ok(viewer) => *self = ViewerApp::Running(Box::new(viewer)),
            Err(e) => {
                log::error!("Viewer setup failed: {e}");
                *error = Some(e);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let ViewerApp::Running(viewer) = self else {
            return;
        };

        viewer.input.handle_event(&event);

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                viewer.gpu.resize(size.width, size.height);
            }
            WindowEvent::RedrawRequested => viewer.redraw(event_loop),
            _ => {}
        }
    }
}

/// A square grid of spheres in the XY plane centred on the origin, plus a camera
/// node on the +Z axis. Returns the scene and the camera node.
fn build_sphere_grid(config: &ViewerConfig, sphere: MeshId) -> (Scene, Node) {
    let scene = Scene::new();
    let count = config.grid_side_count;
    let radius = config.sphere_radius;
    let spacing = 2.0 * radius + config.sphere_padding;
    let side_length =
        2.0 * radius * count as f32 + config.sphere_padding * count.saturating_sub(1) as f32;

    for j in 0..count {
        for i in 0..count {
            let node = Node::named(format!("({i}, {j})"));
            node.set_mesh(Some(sphere));
            node.set_bounding_sphere(BoundingSphere::new(Vec3::ZERO, radius));

            let index = (j * count + i) as f32;
            node.set_color(Color::hsv((index * HUE_STEP).fract(), 1.0, 1.0));

            let position = Vec3::new(
                radius + i as f32 * spacing - side_length / 2.0,
                radius + j as f32 * spacing - side_length / 2.0,
                0.0,
            );
            node.set_transform(Mat4::from_translation(position));
            scene.root_node().add_child_node(&node);
        }
    }

    let camera_node = Node::named("camera");
    camera_node.set_transform(orbit_transform(0.0, config.camera_distance));
    camera_node.set_camera(Some(Camera::new()));
    scene.root_node().add_child_node(&camera_node);

    (scene, camera_node)
}

/// Camera placement `distance` out along +Z, swung `angle` radians around Y.
fn orbit_transform(angle: f32, distance: f32) -> Mat4 {
    Mat4::from_rotation_y(angle) * Mat4::from_translation(Vec3::new(0.0, 0.0, distance))
}

/// Cast a ray from `point_of_view` through `cursor` and return the nearest hit.
fn pick(scene: &Scene, point_of_view: &Node, cursor: Vec2, viewport: Vec2) -> Option<HitResult> {
    let camera = point_of_view.camera()?;
    if viewport.x <= 0.0 || viewport.y <= 0.0 {
        return None;
    }
    let view = point_of_view.world_transform().inverse();
    let projection = camera.projection_matrix(viewport.x / viewport.y);
    let ray = Ray::from_viewport_point(cursor, viewport, view, projection);
    scene.hit_test(&ray)
}
