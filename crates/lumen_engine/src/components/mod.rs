//! Built-in components
//!
//! - [`MeshRenderer`] draws a mesh with a material in every pass
//! - [`Camera`] publishes the main camera
//! - [`DirectionalLight`], [`PointLight`] and [`SpotLight`] register lights
//! - [`FollowComponent`] and [`LookAtComponent`] track another node
//! - [`FreeMove`] and [`FreeLook`] fly the node from keyboard and mouse
//! - [`ArcBall`] orbits a target under mouse control
//! - [`AnimationComponent`] plays a keyframe track on its node
//! - [`Skybox`] keeps a self-lit backdrop centred on the main camera

pub mod animation;
pub mod arc_ball;
pub mod camera;
pub mod follow;
pub mod free_look;
pub mod free_move;
pub mod lights;
pub mod look_at;
pub mod mesh_renderer;
pub mod skybox;

pub use animation::{AnimationComponent, AnimationError, Keyframe, Playback, Track};
pub use arc_ball::ArcBall;
pub use camera::Camera;
pub use follow::FollowComponent;
pub use free_look::FreeLook;
pub use free_move::FreeMove;
pub use lights::{DirectionalLight, PointLight, SpotLight};
pub use look_at::LookAtComponent;
pub use mesh_renderer::MeshRenderer;
pub use skybox::Skybox;
