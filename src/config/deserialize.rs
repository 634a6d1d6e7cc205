// ABOUTME: Custom serde deserializers for config types.
// ABOUTME: Handles the non-empty target group list.

use nonempty::NonEmpty;
use serde::Deserialize;

use crate::types::TargetGroupArn;

pub fn deserialize_target_groups<'de, D>(
    deserializer: D,
) -> Result<NonEmpty<TargetGroupArn>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let values: Vec<String> = Vec::deserialize(deserializer)?;
    if let Some(blank) = values.iter().find(|v| v.trim().is_empty()) {
        return Err(serde::de::Error::custom(format!(
            "target group ARN cannot be blank: {:?}",
            blank
        )));
    }

    NonEmpty::from_vec(values.into_iter().map(TargetGroupArn::new).collect())
        .ok_or_else(|| serde::de::Error::custom("at least one target group is required"))
}
