//! Loads OpenCV-style Haar cascade XML into a [`ClassifierModel`].
//!
//! Expected layout (element names under the root are fixed, the root and
//! cascade element names are not):
//!
//! ```text
//! <root><cascade>
//!   <size>W H</size>
//!   <stages>
//!     <_>
//!       <trees>
//!         <_><_>
//!           <feature><rects><_>x y w h weight</_>...</rects></feature>
//!           <threshold>t</threshold><left_val>l</left_val><right_val>r</right_val>
//!         </_></_>
//!       </trees>
//!       <stage_threshold>s</stage_threshold>
//!     </_>
//!   </stages>
//! </cascade></root>
//! ```
//!
//! Comments are skipped by the reader; unused elements such as `tilted`,
//! `parent` and `next` are ignored.

use std::fs;
use std::path::{Path, PathBuf};

use quick_xml::events::Event;
use quick_xml::Reader;
use thiserror::Error;

use crate::detection::domain::classifier::{ClassifierModel, Feature, Stage, WeightedRect};

/// Rectangles a single feature may combine.
const MAX_RECTS_PER_FEATURE: usize = 3;

#[derive(Error, Debug)]
pub enum ClassifierParseError {
    #[error("malformed cascade XML: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("cascade document has no root element")]
    EmptyDocument,
    #[error("unclosed element <{0}>")]
    Unclosed(String),
    #[error("missing <{element}> in {context}")]
    Missing { element: String, context: String },
    #[error("invalid number {value:?} for {field}")]
    InvalidNumber { field: String, value: String },
    #[error("invalid base window size {0:?}: expected two positive integers")]
    InvalidSize(String),
    #[error("{context}: rectangle {text:?} must have 5 tokens (x y width height weight)")]
    InvalidRect { context: String, text: String },
    #[error("{context}: rectangle {text:?} lies outside the {base_width}x{base_height} base window")]
    RectOutsideWindow {
        context: String,
        text: String,
        base_width: u32,
        base_height: u32,
    },
    #[error("{context}: expected 1 to 3 rectangles, found {count}")]
    RectCount { context: String, count: usize },
    #[error("{context}: expected exactly one decision node, found {count}")]
    TreeShape { context: String, count: usize },
    #[error("stage {0} has no trees")]
    EmptyStage(usize),
    #[error("cascade has no stages")]
    NoStages,
}

#[derive(Error, Debug)]
pub enum CascadeLoadError {
    #[error("failed to read cascade {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid cascade {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ClassifierParseError,
    },
}

/// Parses cascade XML text. Either the whole model is returned or an error;
/// nothing partial is kept.
pub fn load_model(text: &str) -> Result<ClassifierModel, ClassifierParseError> {
    let root = parse_tree(text)?;
    let cascade = root.children.first().ok_or_else(|| ClassifierParseError::Missing {
        element: "cascade".to_string(),
        context: format!("<{}>", root.name),
    })?;

    let (base_width, base_height) = parse_size(cascade.require("size", "cascade")?)?;
    let stages_node = cascade.require("stages", "cascade")?;
    if stages_node.children.is_empty() {
        return Err(ClassifierParseError::NoStages);
    }

    let stages = stages_node
        .children
        .iter()
        .enumerate()
        .map(|(index, node)| parse_stage(node, index, base_width, base_height))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ClassifierModel::new(base_width, base_height, stages))
}

/// Reads and parses a cascade file.
pub fn load_model_file(path: &Path) -> Result<ClassifierModel, CascadeLoadError> {
    let text = fs::read_to_string(path).map_err(|e| CascadeLoadError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    let model = load_model(&text).map_err(|e| CascadeLoadError::Parse {
        path: path.to_path_buf(),
        source: e,
    })?;
    log::info!(
        "Loaded cascade {}: {}x{} base window, {} stages, {} features",
        path.display(),
        model.base_width(),
        model.base_height(),
        model.stages().len(),
        model.feature_count()
    );
    Ok(model)
}

// ---------------------------------------------------------------------------
// Model construction
// ---------------------------------------------------------------------------

fn parse_size(node: &Element) -> Result<(u32, u32), ClassifierParseError> {
    let invalid = || ClassifierParseError::InvalidSize(node.text.trim().to_string());
    let dims: Vec<u32> = node
        .text
        .split_whitespace()
        .map(|t| t.parse::<u32>().map_err(|_| invalid()))
        .collect::<Result<_, _>>()?;
    match dims.as_slice() {
        &[w, h] if w > 0 && h > 0 => Ok((w, h)),
        _ => Err(invalid()),
    }
}

fn parse_stage(
    node: &Element,
    index: usize,
    base_width: u32,
    base_height: u32,
) -> Result<Stage, ClassifierParseError> {
    let context = format!("stage {index}");
    let threshold = parse_number(node.require("stage_threshold", &context)?, "stage_threshold")?;
    let trees = node.require("trees", &context)?;
    if trees.children.is_empty() {
        return Err(ClassifierParseError::EmptyStage(index));
    }

    let features = trees
        .children
        .iter()
        .enumerate()
        .map(|(tree, tree_node)| {
            let context = format!("stage {index}, tree {tree}");
            parse_tree_feature(tree_node, &context, base_width, base_height)
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Stage::new(threshold, features))
}

fn parse_tree_feature(
    tree: &Element,
    context: &str,
    base_width: u32,
    base_height: u32,
) -> Result<Feature, ClassifierParseError> {
    let node = match tree.children.as_slice() {
        [node] => node,
        nodes => {
            return Err(ClassifierParseError::TreeShape {
                context: context.to_string(),
                count: nodes.len(),
            })
        }
    };

    let threshold = parse_number(node.require("threshold", context)?, "threshold")?;
    let left_val = parse_number(node.require("left_val", context)?, "left_val")?;
    let right_val = parse_number(node.require("right_val", context)?, "right_val")?;
    let rects_node = node.require("feature", context)?.require("rects", context)?;

    let count = rects_node.children.len();
    if count == 0 || count > MAX_RECTS_PER_FEATURE {
        return Err(ClassifierParseError::RectCount {
            context: context.to_string(),
            count,
        });
    }

    let rects = rects_node
        .children
        .iter()
        .map(|r| parse_rect(&r.text, context, base_width, base_height))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Feature::new(threshold, left_val, right_val, rects))
}

/// Parses `x y width height weight`.
fn parse_rect(
    text: &str,
    context: &str,
    base_width: u32,
    base_height: u32,
) -> Result<WeightedRect, ClassifierParseError> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    let [x, y, w, h, weight] = tokens.as_slice() else {
        return Err(ClassifierParseError::InvalidRect {
            context: context.to_string(),
            text: text.trim().to_string(),
        });
    };

    let rect = WeightedRect::new(
        parse_token::<u32>(x, "rect x")?,
        parse_token::<u32>(y, "rect y")?,
        parse_token::<u32>(w, "rect width")?,
        parse_token::<u32>(h, "rect height")?,
        parse_token::<f64>(weight, "rect weight")?,
    );

    // Zero extents are allowed; such a rect sums to 0.
    let fits = u64::from(rect.x_offset) + u64::from(rect.width_delta) <= u64::from(base_width)
        && u64::from(rect.y_offset) + u64::from(rect.height_delta) <= u64::from(base_height);
    if !fits {
        return Err(ClassifierParseError::RectOutsideWindow {
            context: context.to_string(),
            text: text.trim().to_string(),
            base_width,
            base_height,
        });
    }
    Ok(rect)
}

fn parse_number(node: &Element, field: &str) -> Result<f64, ClassifierParseError> {
    parse_token(node.text.trim(), field)
}

fn parse_token<T: std::str::FromStr>(token: &str, field: &str) -> Result<T, ClassifierParseError> {
    token.parse().map_err(|_| ClassifierParseError::InvalidNumber {
        field: field.to_string(),
        value: token.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Element tree
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct Element {
    name: String,
    text: String,
    children: Vec<Element>,
}

impl Element {
    fn named(name: String) -> Self {
        Self {
            name,
            ..Self::default()
        }
    }

    fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    fn require(&self, name: &str, context: &str) -> Result<&Element, ClassifierParseError> {
        self.child(name).ok_or_else(|| ClassifierParseError::Missing {
            element: name.to_string(),
            context: context.to_string(),
        })
    }
}

/// Builds an element tree, keeping element names and text content only.
///
/// Text is kept untrimmed so that whitespace on either side of a comment
/// still separates the tokens around it; consumers trim or split it.
fn parse_tree(text: &str) -> Result<Element, ClassifierParseError> {
    let mut reader = Reader::from_str(text);
    let mut buf = Vec::new();
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                stack.push(Element::named(name));
            }
            Event::Empty(e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                attach(&mut stack, &mut root, Element::named(name));
            }
            Event::Text(t) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&t.unescape()?);
                }
            }
            Event::CData(t) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&String::from_utf8_lossy(&t.into_inner()));
                }
            }
            Event::End(_) => {
                if let Some(done) = stack.pop() {
                    attach(&mut stack, &mut root, done);
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if let Some(open) = stack.pop() {
        return Err(ClassifierParseError::Unclosed(open.name));
    }
    root.ok_or(ClassifierParseError::EmptyDocument)
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None => {
            if root.is_none() {
                *root = Some(element);
            }
        }
    }
}
