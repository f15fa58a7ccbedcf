// src/controls.rs

pub const SPIN_DEGREES_PER_SECOND: f64 = 50.0;
pub const ZOOM_STEP: f64 = 1.25;
pub const MIN_ZOOM: f64 = 0.25;
pub const MAX_ZOOM: f64 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Reinitialize,
    ToggleColor,
    Help,
    Quit,
    CycleLighting,
    ToggleShading,
    ToggleLightAnchor,
    ToggleMaterial,
    ZoomIn,
    ZoomOut,
    ToggleWireframe,
}

impl Command {
    pub fn from_key(key: char) -> Option<Self> {
        match key.to_ascii_lowercase() {
            'i' => Some(Command::Reinitialize),
            'c' => Some(Command::ToggleColor),
            'h' => Some(Command::Help),
            'q' | '\u{1b}' => Some(Command::Quit),
            'o' => Some(Command::CycleLighting),
            's' => Some(Command::ToggleShading),
            'l' => Some(Command::ToggleLightAnchor),
            'm' => Some(Command::ToggleMaterial),
            'z' => Some(Command::ZoomIn),
            'w' => Some(Command::ZoomOut),
            _ => None,
        }
    }

    pub fn from_left_click() -> Self {
        Command::ToggleWireframe
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tint {
    Red,
    Brown,
}

impl Tint {
    pub fn rgba(self) -> [f32; 4] {
        match self {
            Tint::Red => [1.0, 0.0, 0.0, 1.0],
            Tint::Brown => [0.6, 0.3, 0.0, 1.0],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shading {
    Gouraud,
    Phong,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Material {
    Plastic,
    Metallic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightAnchor {
    Fixed,
    FollowsObject,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LightingComponents {
    pub ambient: bool,
    pub diffuse: bool,
    pub specular: bool,
}

impl LightingComponents {
    pub const ALL: LightingComponents = LightingComponents {
        ambient: true,
        diffuse: true,
        specular: true,
    };

    /// Turns components off one at a time (specular, diffuse, ambient), then
    /// brings them all back.
    fn cycle(self) -> Self {
        if self.specular {
            LightingComponents {
                specular: false,
                ..self
            }
        } else if self.diffuse {
            LightingComponents {
                diffuse: false,
                ..self
            }
        } else if self.ambient {
            LightingComponents {
                ambient: false,
                ..self
            }
        } else {
            Self::ALL
        }
    }
}

/// Presentation toggles read by the renderer. Physics never looks at these.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneState {
    pub tint: Tint,
    pub shading: Shading,
    pub material: Material,
    pub lighting: LightingComponents,
    pub light_anchor: LightAnchor,
    pub wireframe: bool,
    pub zoom: f64,
    pub spin_degrees: f64,
}

impl Default for SceneState {
    fn default() -> Self {
        SceneState {
            tint: Tint::Red,
            shading: Shading::Gouraud,
            material: Material::Plastic,
            lighting: LightingComponents::ALL,
            light_anchor: LightAnchor::Fixed,
            wireframe: false,
            zoom: 1.0,
            spin_degrees: 0.0,
        }
    }
}

impl SceneState {
    /// Applies a presentation command. Commands that concern the simulation
    /// itself are ignored here.
    pub fn apply(&mut self, command: Command) {
        match command {
            Command::ToggleColor => {
                self.tint = match self.tint {
                    Tint::Red => Tint::Brown,
                    Tint::Brown => Tint::Red,
                }
            }
            Command::ToggleShading => {
                self.shading = match self.shading {
                    Shading::Gouraud => Shading::Phong,
                    Shading::Phong => Shading::Gouraud,
                }
            }
            Command::ToggleMaterial => {
                self.material = match self.material {
                    Material::Plastic => Material::Metallic,
                    Material::Metallic => Material::Plastic,
                }
            }
            Command::ToggleLightAnchor => {
                self.light_anchor = match self.light_anchor {
                    LightAnchor::Fixed => LightAnchor::FollowsObject,
                    LightAnchor::FollowsObject => LightAnchor::Fixed,
                }
            }
            Command::CycleLighting => self.lighting = self.lighting.cycle(),
            Command::ZoomIn => self.zoom = (self.zoom * ZOOM_STEP).min(MAX_ZOOM),
            Command::ZoomOut => self.zoom = (self.zoom / ZOOM_STEP).max(MIN_ZOOM),
            Command::ToggleWireframe => self.wireframe = !self.wireframe,
            Command::Reinitialize | Command::Help | Command::Quit => {}
        }
    }

    pub fn advance_spin(&mut self, dt: f64) {
        self.spin_degrees = (self.spin_degrees + SPIN_DEGREES_PER_SECOND * dt).rem_euclid(360.0);
    }
}

pub fn help_text() -> &'static str {
    "i -- reinitialize the ball at the top left corner\n\
     c -- switch between red and brown\n\
     o -- turn off specular, diffuse and ambient light one by one\n\
     s -- switch between Gouraud and Phong shading\n\
     l -- keep the light fixed or let it follow the ball\n\
     m -- switch between plastic and metallic material\n\
     z / w -- zoom in / out\n\
     left click -- toggle wireframe\n\
     h -- print this help\n\
     q -- quit"
}
