// Copyright 2024 FastLabs Developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Encoding of entry data into its log-safe form.

use crate::config::SerializeConfig;
use crate::value::LogData;
use crate::value::LogValue;

/// Encodes every value in `data` to the log-safe subset of [`LogValue`].
///
/// Scalars pass through. Arrays are always encoded element-wise; nested maps
/// only when [`deep_encode`](SerializeConfig::deep_encode) is set.
/// [`Shared`](LogValue::Shared) handles are followed, and a handle that is
/// already being encoded resolves to the `"<PtrToSelf>"` sentinel instead of
/// recursing. [`Rich`](LogValue::Rich) values expand through their
/// [`Encode`](crate::Encode) impl when
/// [`encode_rich_types`](SerializeConfig::encode_rich_types) is set, and
/// render as `"<TypeName>"` otherwise. Never fails; any degenerate value
/// degrades to a placeholder string on its own.
pub fn serialize(config: &SerializeConfig, data: &LogData) -> LogData {
    let mut active = Vec::new();
    data.iter()
        .map(|(key, value)| (key.clone(), encode_value(config, value, &mut active)))
        .collect()
}

fn encode_value(
    config: &SerializeConfig,
    value: &LogValue,
    active: &mut Vec<*const ()>,
) -> LogValue {
    match value {
        LogValue::Null
        | LogValue::Bool(_)
        | LogValue::Int(_)
        | LogValue::Float(_)
        | LogValue::Str(_) => value.clone(),
        LogValue::Array(items) => LogValue::Array(
            items
                .iter()
                .map(|item| encode_value(config, item, active))
                .collect(),
        ),
        LogValue::Map(entries) => {
            if !config.deep_encode {
                return value.clone();
            }
            LogValue::Map(
                entries
                    .iter()
                    .map(|(key, nested)| (key.clone(), encode_value(config, nested, active)))
                    .collect(),
            )
        }
        LogValue::Shared(shared) => {
            let ptr = shared.ptr();
            if active.contains(&ptr) {
                return LogValue::Str("<PtrToSelf>".to_owned());
            }
            active.push(ptr);
            let encoded = encode_value(config, &shared.snapshot(), active);
            active.pop();
            encoded
        }
        LogValue::Rich(rich) => {
            if config.encode_rich_types {
                encode_value(config, &rich.encode(), active)
            } else {
                LogValue::Str(format!("<{}>", rich.type_name()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Encode;
    use crate::value::SharedValue;
    use crate::data;

    struct Vec2 {
        x: f64,
        y: f64,
    }

    impl Encode for Vec2 {
        fn type_name(&self) -> &'static str {
            "Vec2"
        }

        fn encode(&self) -> LogValue {
            LogValue::from(data! { "x" => self.x, "y" => self.y })
        }
    }

    fn rich(x: f64, y: f64) -> LogValue {
        LogValue::Rich(std::sync::Arc::new(Vec2 { x, y }))
    }

    #[test]
    fn scalars_pass_through() {
        let config = SerializeConfig::default();
        let data = data! { "n" => 1, "s" => "x", "b" => true, "f" => 1.5 };
        assert_eq!(serialize(&config, &data), data);
    }

    #[test]
    fn nested_maps_encode_when_deep() {
        let config = SerializeConfig::default();
        let data = data! {
            "player" => data! { "name" => "daymon", "position" => rich(1.0, 2.0) },
        };

        let encoded = serialize(&config, &data);
        let player = encoded.get("player").and_then(LogValue::as_map).unwrap();
        assert_eq!(
            player.get("position"),
            Some(&LogValue::from(data! { "x" => 1.0, "y" => 2.0 }))
        );
    }

    #[test]
    fn nested_maps_pass_raw_when_shallow() {
        let config = SerializeConfig {
            deep_encode: false,
            ..SerializeConfig::default()
        };
        let inner = data! { "position" => rich(1.0, 2.0) };
        let data = data! { "player" => inner.clone() };

        let encoded = serialize(&config, &data);
        assert_eq!(encoded.get("player"), Some(&LogValue::from(inner)));
    }

    #[test]
    fn arrays_always_encode() {
        let config = SerializeConfig {
            deep_encode: false,
            ..SerializeConfig::default()
        };
        let data = data! { "points" => vec![rich(1.0, 2.0)] };

        let encoded = serialize(&config, &data);
        let LogValue::Array(points) = encoded.get("points").unwrap() else {
            panic!("expected array");
        };
        assert_eq!(points[0], LogValue::from(data! { "x" => 1.0, "y" => 2.0 }));
    }

    #[test]
    fn rich_types_render_placeholders_when_disabled() {
        let config = SerializeConfig {
            encode_rich_types: false,
            ..SerializeConfig::default()
        };
        let data = data! { "position" => rich(1.0, 2.0) };

        let encoded = serialize(&config, &data);
        assert_eq!(
            encoded.get("position").and_then(LogValue::as_str),
            Some("<Vec2>")
        );
    }

    #[test]
    fn self_references_become_sentinels() {
        let config = SerializeConfig::default();
        let myself = SharedValue::map();
        myself.insert("name", "x");
        myself.insert("myself", myself.clone());

        let encoded = serialize(&config, &data! { "root" => myself });
        let root = encoded.get("root").and_then(LogValue::as_map).unwrap();
        assert_eq!(root.get("name").and_then(LogValue::as_str), Some("x"));
        assert_eq!(
            root.get("myself").and_then(LogValue::as_str),
            Some("<PtrToSelf>")
        );
    }

    #[test]
    fn shared_values_without_cycles_resolve() {
        let config = SerializeConfig::default();
        let shared = SharedValue::new(LogValue::Int(42));
        let data = data! { "a" => shared.clone(), "b" => shared };

        let encoded = serialize(&config, &data);
        assert_eq!(encoded.get("a"), Some(&LogValue::Int(42)));
        assert_eq!(encoded.get("b"), Some(&LogValue::Int(42)));
    }
}
