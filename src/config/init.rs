// ABOUTME: Config scaffolding for new projects.
// ABOUTME: Creates fleetroll.yml template files.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

use super::CONFIG_FILENAME;

pub fn init_config(dir: &Path, fleet: Option<&str>, force: bool) -> Result<PathBuf> {
    let config_path = dir.join(CONFIG_FILENAME);

    if config_path.exists() && !force {
        return Err(Error::AlreadyExists(config_path));
    }

    std::fs::write(&config_path, generate_template_yaml(fleet))?;
    Ok(config_path)
}

pub(crate) fn generate_template_yaml(fleet: Option<&str>) -> String {
    let name = match fleet {
        Some(name) => name.to_string(),
        None => "{ env: AUTO_SCALING_GROUP_NAME }".to_string(),
    };
    format!(
        r#"fleet:
  name: {}
  # Parameter holding any valid image id, used while nothing is published yet
  default_image_parameter: {{ env: DEFAULT_AMI_SSM_PARAMETER, default: /fleet/default-image }}
  drain:
    interval: 30s
    max_attempts: 30

# Needed by signal-instance only
# signal:
#   stack_name: {{ env: STACK_NAME }}
#   logical_resource_id: {{ env: LOGICAL_RESOURCE_ID }}
#   target_groups:
#     - arn:aws:elasticloadbalancing:eu-west-1:111111111111:targetgroup/web/0123456789abcdef
#   health:
#     interval: 30s
#     max_attempts: 1000
"#,
        name
    )
}
