//! Scoped resource dictionaries.

use std::collections::HashMap;
use std::sync::Arc;

use crate::document::font::Font;
use crate::document::xobject::{TilingPattern, XObject};
use crate::model::color::ColorSpace;
use crate::model::objects::Dict;

/// The resource dictionary a stream executes against.
///
/// Lookups are by the name used in the content stream. Getters hand out
/// cheap clones (the heavyweight entries are behind `Arc`); a miss is a
/// `MissingResource` condition at the operator layer, not here.
#[derive(Debug, Clone, Default)]
pub struct Resources {
    fonts: HashMap<String, Arc<dyn Font>>,
    xobjects: HashMap<String, XObject>,
    ext_g_states: HashMap<String, Dict>,
    patterns: HashMap<String, Arc<TilingPattern>>,
    color_spaces: HashMap<String, ColorSpace>,
    properties: HashMap<String, Dict>,
}

impl Resources {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_font(mut self, name: &str, font: Arc<dyn Font>) -> Self {
        self.fonts.insert(name.to_string(), font);
        self
    }

    pub fn with_xobject(mut self, name: &str, xobject: XObject) -> Self {
        self.xobjects.insert(name.to_string(), xobject);
        self
    }

    pub fn with_ext_g_state(mut self, name: &str, params: Dict) -> Self {
        self.ext_g_states.insert(name.to_string(), params);
        self
    }

    pub fn with_pattern(mut self, name: &str, pattern: Arc<TilingPattern>) -> Self {
        self.patterns.insert(name.to_string(), pattern);
        self
    }

    pub fn with_color_space(mut self, name: &str, space: ColorSpace) -> Self {
        self.color_spaces.insert(name.to_string(), space);
        self
    }

    pub fn with_properties(mut self, name: &str, properties: Dict) -> Self {
        self.properties.insert(name.to_string(), properties);
        self
    }

    pub fn font(&self, name: &str) -> Option<Arc<dyn Font>> {
        self.fonts.get(name).cloned()
    }

    pub fn xobject(&self, name: &str) -> Option<XObject> {
        self.xobjects.get(name).cloned()
    }

    pub fn ext_g_state(&self, name: &str) -> Option<&Dict> {
        self.ext_g_states.get(name)
    }

    pub fn pattern(&self, name: &str) -> Option<Arc<TilingPattern>> {
        self.patterns.get(name).cloned()
    }

    pub fn color_space(&self, name: &str) -> Option<&ColorSpace> {
        self.color_spaces.get(name)
    }

    pub fn properties(&self, name: &str) -> Option<&Dict> {
        self.properties.get(name)
    }
}
