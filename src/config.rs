//! Loading app configuration (tutor prompts + optional content bank) from TOML.
//!
//! See `AppConfig` for the expected schema. The ML service location itself is
//! env-driven (`ML_SERVICE_URL`), like the rest of the deployment knobs.

use serde::Deserialize;
use tracing::{error, info};

use crate::domain::{Question, TextResource};

#[derive(Clone, Debug, Deserialize, Default)]
pub struct AppConfig {
  #[serde(default)]
  pub prompts: Prompts,
  #[serde(default)]
  pub courses: Vec<CourseCfg>,
  #[serde(default)]
  pub quizzes: Vec<QuizCfg>,
}

/// Course entry accepted in TOML configuration. Thumbnails and source tags
/// are defaulted the same way the create-course endpoint defaults them.
#[derive(Clone, Debug, Deserialize)]
pub struct CourseCfg {
  #[serde(default)] pub id: Option<String>,
  pub title: String,
  pub description: String,
  #[serde(default)] pub videos: Vec<VideoCfg>,
  #[serde(default)] pub text_resources: Vec<TextResource>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct VideoCfg {
  #[serde(default)] pub title: Option<String>,
  pub url: String,
  #[serde(default)] pub source: Option<String>,
  #[serde(default)] pub thumbnail: Option<String>,
}

/// Quiz entry accepted in TOML configuration. Questions use the same tagged
/// shape as the API (`type = "multiple_choice" | "fill_in_blank" | "descriptive"`).
#[derive(Clone, Debug, Deserialize)]
pub struct QuizCfg {
  #[serde(default)] pub id: Option<String>,
  pub title: String,
  pub description: String,
  pub questions: Vec<Question>,
}

/// Prompt templates sent to the ML tutor. Defaults match the tone the SPA
/// expects; override in TOML to tune it.
#[derive(Clone, Debug, Deserialize)]
pub struct Prompts {
  pub tutor_template: String,
  pub tutor_course_template: String,
}

impl Default for Prompts {
  fn default() -> Self {
    Self {
      tutor_template: "Answer this as a teacher: {message}".into(),
      tutor_course_template:
        "Answer this as a teacher for the course '{course_title}': {message}".into(),
    }
  }
}

/// Attempt to load `AppConfig` from ELEARN_CONFIG_PATH. On any parsing/IO
/// error, returns None.
pub fn load_app_config_from_env() -> Option<AppConfig> {
  let path = std::env::var("ELEARN_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match toml::from_str::<AppConfig>(&s) {
      Ok(cfg) => {
        info!(target: "elearn_backend", %path, "Loaded app config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "elearn_backend", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "elearn_backend", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}
