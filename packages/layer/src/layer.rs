//! Styled map layers and the map context they are attached to.
//!
//! A [`MapLayer`] starts empty, bound to a [`FeatureStyler`], and grows
//! as geometry collections are merged in. Each merged feature is styled
//! exactly once. Layers are shared through [`LayerHandle`] so the caller
//! can observe a layer while batches are still arriving.

use std::collections::BTreeSet;
use std::sync::{Arc, PoisonError, RwLock};

use choropleth_map_models::StyleDescriptor;
use geojson::{Feature, FeatureCollection, JsonObject, JsonValue};

use crate::{FeatureStyler, StyleOutcome};

/// A feature together with the style computed when it was merged.
#[derive(Debug, Clone)]
pub struct StyledFeature {
    /// Region identifier read from the join attribute, if present.
    pub id: Option<String>,
    /// Styling branch taken.
    pub outcome: StyleOutcome,
    /// Computed style.
    pub style: StyleDescriptor,
    /// The untouched source feature.
    pub feature: Feature,
}

impl StyledFeature {
    /// Returns a copy of the feature with style and value written into
    /// its properties using simplestyle keys.
    #[must_use]
    pub fn to_styled_feature(&self) -> Feature {
        let mut feature = self.feature.clone();
        let props = feature.properties.get_or_insert_with(JsonObject::new);
        props.insert("stroke".into(), self.style.stroke_color.clone().into());
        props.insert("stroke-width".into(), self.style.stroke_weight.into());
        props.insert("fill".into(), self.style.fill_color.clone().into());
        props.insert("fill-opacity".into(), self.style.fill_opacity.into());
        props.insert(
            "value".into(),
            self.outcome.value().map_or(JsonValue::Null, JsonValue::from),
        );
        feature
    }
}

/// An order-insensitive, append-only collection of styled features.
#[derive(Debug)]
pub struct MapLayer {
    name: String,
    join_column: String,
    styler: Arc<FeatureStyler>,
    features: Vec<StyledFeature>,
}

impl MapLayer {
    /// Creates an empty layer bound to `styler`.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        join_column: impl Into<String>,
        styler: Arc<FeatureStyler>,
    ) -> Self {
        Self {
            name: name.into(),
            join_column: join_column.into(),
            styler,
            features: Vec::new(),
        }
    }

    /// Returns the layer name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the styler bound at creation.
    #[must_use]
    pub fn styler(&self) -> &FeatureStyler {
        &self.styler
    }

    /// Styles and appends every feature of `collection`, returning the
    /// identifiers of the features added (in arrival order, `None` for
    /// features lacking the join attribute).
    pub fn merge(&mut self, collection: FeatureCollection) -> Vec<Option<String>> {
        let mut added = Vec::with_capacity(collection.features.len());
        for feature in collection.features {
            let id = region_id(&feature, &self.join_column);
            let outcome = self.styler.outcome(id.as_deref());
            let style = self.styler.describe(outcome);
            added.push(id.clone());
            self.features.push(StyledFeature {
                id,
                outcome,
                style,
                feature,
            });
        }
        added
    }

    /// Returns every feature merged so far.
    #[must_use]
    pub fn features(&self) -> &[StyledFeature] {
        &self.features
    }

    /// Returns the identifiers of all merged features.
    #[must_use]
    pub fn ids(&self) -> BTreeSet<String> {
        self.features.iter().filter_map(|f| f.id.clone()).collect()
    }

    /// Returns the number of merged features.
    #[must_use]
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Returns `true` if nothing has been merged yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Renders the layer as a `FeatureCollection` with style properties.
    #[must_use]
    pub fn to_feature_collection(&self) -> FeatureCollection {
        FeatureCollection {
            bbox: None,
            features: self
                .features
                .iter()
                .map(StyledFeature::to_styled_feature)
                .collect(),
            foreign_members: None,
        }
    }
}

/// Reads the region identifier from `feature`'s properties.
///
/// String and numeric attributes are accepted.
#[must_use]
pub fn region_id(feature: &Feature, join_column: &str) -> Option<String> {
    match feature.properties.as_ref()?.get(join_column)? {
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Shared handle to a [`MapLayer`].
///
/// Merges take the write lock for the duration of one collection and
/// never across an await point.
#[derive(Debug, Clone)]
pub struct LayerHandle {
    inner: Arc<RwLock<MapLayer>>,
}

impl LayerHandle {
    /// Wraps `layer` for sharing.
    #[must_use]
    pub fn new(layer: MapLayer) -> Self {
        Self {
            inner: Arc::new(RwLock::new(layer)),
        }
    }

    /// Merges `collection` into the layer. See [`MapLayer::merge`].
    pub fn merge(&self, collection: FeatureCollection) -> Vec<Option<String>> {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .merge(collection)
    }

    /// Runs `f` with shared access to the layer.
    pub fn read<T>(&self, f: impl FnOnce(&MapLayer) -> T) -> T {
        f(&self.inner.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Returns the current number of features.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read(MapLayer::len)
    }

    /// Returns `true` if nothing has been merged yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read(MapLayer::is_empty)
    }
}

/// The display surface layers are attached to.
pub trait MapContext {
    /// Attaches `layer` for display. The layer may still be empty and
    /// keep growing afterwards.
    fn attach(&mut self, layer: LayerHandle);
}

/// A [`MapContext`] that renders attached layers to `GeoJSON`.
#[derive(Debug, Default)]
pub struct GeoJsonMap {
    layers: Vec<LayerHandle>,
}

impl GeoJsonMap {
    /// Creates a map with no layers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the attached layers in attachment order.
    #[must_use]
    pub fn layers(&self) -> &[LayerHandle] {
        &self.layers
    }

    /// Renders the current contents of every attached layer as one
    /// `FeatureCollection`, with the class legend of each layer stored
    /// under the foreign member `legend`.
    ///
    /// # Errors
    ///
    /// Returns [`serde_json::Error`] if a legend cannot be serialized.
    pub fn render(&self) -> Result<FeatureCollection, serde_json::Error> {
        let mut features = Vec::new();
        let mut legend = Vec::new();

        for handle in &self.layers {
            handle.read(|layer| -> Result<(), serde_json::Error> {
                features.extend(layer.to_feature_collection().features);
                for entry in layer.styler().classifier().legend() {
                    let mut row = match serde_json::to_value(entry)? {
                        JsonValue::Object(map) => map,
                        _ => JsonObject::new(),
                    };
                    row.insert("layer".into(), layer.name().into());
                    legend.push(JsonValue::Object(row));
                }
                Ok(())
            })?;
        }

        let mut foreign_members = JsonObject::new();
        foreign_members.insert("legend".into(), JsonValue::Array(legend));

        Ok(FeatureCollection {
            bbox: None,
            features,
            foreign_members: Some(foreign_members),
        })
    }
}

impl MapContext for GeoJsonMap {
    fn attach(&mut self, layer: LayerHandle) {
        log::debug!("Attached layer '{}'", layer.read(|l| l.name().to_string()));
        self.layers.push(layer);
    }
}

#[cfg(test)]
mod tests {
    use choropleth_map_classify::Classifier;
    use choropleth_map_models::StyleConfig;

    use super::*;
    use crate::ValueTable;

    fn styler() -> Arc<FeatureStyler> {
        let table = Arc::new(ValueTable::from_json_str(r#"{"A": 1, "B": 5, "C": 10}"#).unwrap());
        let classifier =
            Classifier::new(table.values(), &["#d01c8b", "#f1b6da", "#b8e186", "#4dac26"])
                .unwrap();
        Arc::new(FeatureStyler::new(table, classifier, StyleConfig::default()))
    }

    fn feature(id: serde_json::Value) -> Feature {
        serde_json::from_value(serde_json::json!({
            "type": "Feature",
            "geometry": {"type": "Point", "coordinates": [-1.9, 52.48]},
            "properties": {"CODE": id, "NAME": "somewhere"}
        }))
        .unwrap()
    }

    fn collection(features: Vec<Feature>) -> FeatureCollection {
        FeatureCollection {
            bbox: None,
            features,
            foreign_members: None,
        }
    }

    #[test]
    fn merge_styles_each_feature() {
        let mut layer = MapLayer::new("test", "CODE", styler());
        assert!(layer.is_empty());

        let added = layer.merge(collection(vec![
            feature("A".into()),
            feature("D".into()),
        ]));
        assert_eq!(added, vec![Some("A".to_string()), Some("D".to_string())]);
        assert_eq!(layer.len(), 2);
        assert_eq!(layer.features()[0].style.fill_color, "#d01c8b");
        assert_eq!(layer.features()[1].outcome, StyleOutcome::NoData);
    }

    #[test]
    fn merge_keeps_features_without_identifier() {
        let mut layer = MapLayer::new("test", "CODE", styler());
        layer.merge(collection(vec![feature(JsonValue::Null)]));
        assert_eq!(layer.len(), 1);
        assert_eq!(layer.features()[0].id, None);
        assert_eq!(layer.features()[0].style.fill_color, "#cccccc");
    }

    #[test]
    fn numeric_identifiers_are_read_as_strings() {
        let f = feature(serde_json::json!(42));
        assert_eq!(region_id(&f, "CODE"), Some("42".to_string()));
        assert_eq!(region_id(&f, "MISSING"), None);
    }

    #[test]
    fn styled_feature_keeps_properties_and_adds_style() {
        let mut layer = MapLayer::new("test", "CODE", styler());
        layer.merge(collection(vec![feature("C".into())]));
        let rendered = layer.to_feature_collection();
        let props = rendered.features[0].properties.as_ref().unwrap();
        assert_eq!(props["NAME"], "somewhere");
        assert_eq!(props["fill"], "#4dac26");
        assert_eq!(props["stroke"], "black");
        assert_eq!(props["value"], 10.0);
        assert!(rendered.features[0].geometry.is_some());
    }

    #[test]
    fn geojson_map_renders_attached_layers_with_legend() {
        let handle = LayerHandle::new(MapLayer::new("imd", "CODE", styler()));
        let mut map = GeoJsonMap::new();
        map.attach(handle.clone());

        handle.merge(collection(vec![feature("A".into())]));
        handle.merge(collection(vec![feature("B".into())]));

        let rendered = map.render().unwrap();
        assert_eq!(rendered.features.len(), 2);
        let legend = &rendered.foreign_members.as_ref().unwrap()["legend"];
        assert_eq!(legend.as_array().map(Vec::len), Some(4));
        assert_eq!(legend[0]["layer"], "imd");
    }
}
