//! Page object model.
//!
//! Everything a page content provider can hand us is one variant of the
//! closed [`PageObject`] set. All variants share `page_number`, `bbox` and
//! `doctop`; each carries only its own extra fields. Serialization switches
//! on the discriminant through [`ObjectRecord`].

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::geometry::{BBox, HasBBox};

/// A colour as a list of components in the object's colour space.
pub type Color = Vec<f64>;

/// A 2D point in page space (top-down).
pub type Point = (f64, f64);

fn default_upright() -> bool {
    true
}

/// One positioned character primitive.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Glyph {
    pub page_number: usize,
    #[serde(flatten)]
    pub bbox: BBox,
    /// Top offset from the start of the whole document.
    pub doctop: f64,
    /// A single grapheme.
    pub text: SmolStr,
    /// Opaque font identifier.
    #[serde(default)]
    pub fontname: SmolStr,
    pub size: f64,
    #[serde(default = "default_upright")]
    pub upright: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroking_color: Option<Color>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub non_stroking_color: Option<Color>,
}

impl Glyph {
    /// Creates an upright glyph on `page_number` whose doctop equals its top.
    pub fn new(
        page_number: usize,
        bbox: BBox,
        text: impl Into<SmolStr>,
        fontname: impl Into<SmolStr>,
        size: f64,
    ) -> Self {
        Self {
            page_number,
            bbox,
            doctop: bbox.top(),
            text: text.into(),
            fontname: fontname.into(),
            size,
            upright: true,
            stroking_color: None,
            non_stroking_color: None,
        }
    }

    pub fn with_doctop(mut self, doctop: f64) -> Self {
        self.doctop = doctop;
        self
    }

    pub fn with_upright(mut self, upright: bool) -> Self {
        self.upright = upright;
        self
    }

    /// True when the glyph's text is empty or whitespace only.
    pub fn is_blank(&self) -> bool {
        self.text.chars().all(char::is_whitespace)
    }
}

impl HasBBox for Glyph {
    fn bbox(&self) -> BBox {
        self.bbox
    }
}

/// A stroked or filled path: line segment, rectangle or curve.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PathObject {
    pub page_number: usize,
    #[serde(flatten)]
    pub bbox: BBox,
    pub doctop: f64,
    #[serde(default)]
    pub linewidth: f64,
    #[serde(default = "default_upright")]
    pub stroke: bool,
    #[serde(default)]
    pub fill: bool,
    /// Path vertices; empty for lines and rects, whose geometry is the bbox.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pts: Vec<Point>,
}

impl PathObject {
    pub fn new(page_number: usize, bbox: BBox) -> Self {
        Self {
            page_number,
            bbox,
            doctop: bbox.top(),
            linewidth: 1.0,
            stroke: true,
            fill: false,
            pts: Vec::new(),
        }
    }

    pub fn with_points(mut self, pts: Vec<Point>) -> Self {
        self.pts = pts;
        self
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImageObject {
    pub page_number: usize,
    #[serde(flatten)]
    pub bbox: BBox,
    pub doctop: f64,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub srcsize: Option<(u32, u32)>,
}

/// An annotation or hyperlink area.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub page_number: usize,
    #[serde(flatten)]
    pub bbox: BBox,
    pub doctop: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contents: Option<String>,
}

/// Discriminant of a [`PageObject`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectType {
    Char,
    Line,
    Rect,
    Curve,
    Image,
    Annot,
    Hyperlink,
}

/// A positioned page primitive.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "object_type", rename_all = "snake_case")]
pub enum PageObject {
    Char(Glyph),
    Line(PathObject),
    Rect(PathObject),
    Curve(PathObject),
    Image(ImageObject),
    Annot(Annotation),
    Hyperlink(Annotation),
}

impl PageObject {
    pub fn object_type(&self) -> ObjectType {
        match self {
            PageObject::Char(_) => ObjectType::Char,
            PageObject::Line(_) => ObjectType::Line,
            PageObject::Rect(_) => ObjectType::Rect,
            PageObject::Curve(_) => ObjectType::Curve,
            PageObject::Image(_) => ObjectType::Image,
            PageObject::Annot(_) => ObjectType::Annot,
            PageObject::Hyperlink(_) => ObjectType::Hyperlink,
        }
    }

    pub fn page_number(&self) -> usize {
        match self {
            PageObject::Char(g) => g.page_number,
            PageObject::Line(p) | PageObject::Rect(p) | PageObject::Curve(p) => p.page_number,
            PageObject::Image(i) => i.page_number,
            PageObject::Annot(a) | PageObject::Hyperlink(a) => a.page_number,
        }
    }

    pub fn doctop(&self) -> f64 {
        match self {
            PageObject::Char(g) => g.doctop,
            PageObject::Line(p) | PageObject::Rect(p) | PageObject::Curve(p) => p.doctop,
            PageObject::Image(i) => i.doctop,
            PageObject::Annot(a) | PageObject::Hyperlink(a) => a.doctop,
        }
    }

    pub fn as_glyph(&self) -> Option<&Glyph> {
        match self {
            PageObject::Char(g) => Some(g),
            _ => None,
        }
    }

    /// Flattens the object into its serialization record.
    ///
    /// `y0`/`y1` are bottom-up coordinates measured from `page_bottom`, the
    /// `bottom` of the page bbox (the page height only when the page starts
    /// at `top = 0`).
    pub fn record(&self, page_bottom: f64) -> ObjectRecord<'_> {
        let bbox = self.bbox();
        let attrs = match self {
            PageObject::Char(g) => ObjectAttrs::Char {
                text: &g.text,
                fontname: &g.fontname,
                size: g.size,
                upright: g.upright,
                stroking_color: g.stroking_color.as_deref(),
                non_stroking_color: g.non_stroking_color.as_deref(),
            },
            PageObject::Line(p) | PageObject::Rect(p) | PageObject::Curve(p) => ObjectAttrs::Path {
                linewidth: p.linewidth,
                stroke: p.stroke,
                fill: p.fill,
                pts: &p.pts,
            },
            PageObject::Image(i) => ObjectAttrs::Image {
                name: &i.name,
                srcsize: i.srcsize,
            },
            PageObject::Annot(a) | PageObject::Hyperlink(a) => ObjectAttrs::Annotation {
                uri: a.uri.as_deref(),
                title: a.title.as_deref(),
                contents: a.contents.as_deref(),
            },
        };
        ObjectRecord {
            object_type: self.object_type(),
            page_number: self.page_number(),
            x0: bbox.x0(),
            y0: page_bottom - bbox.bottom(),
            x1: bbox.x1(),
            y1: page_bottom - bbox.top(),
            top: bbox.top(),
            bottom: bbox.bottom(),
            doctop: self.doctop(),
            width: bbox.width(),
            height: bbox.height(),
            attrs,
        }
    }
}

impl HasBBox for PageObject {
    fn bbox(&self) -> BBox {
        match self {
            PageObject::Char(g) => g.bbox,
            PageObject::Line(p) | PageObject::Rect(p) | PageObject::Curve(p) => p.bbox,
            PageObject::Image(i) => i.bbox,
            PageObject::Annot(a) | PageObject::Hyperlink(a) => a.bbox,
        }
    }
}

impl From<Glyph> for PageObject {
    fn from(g: Glyph) -> Self {
        PageObject::Char(g)
    }
}

/// Flat serialization form of a [`PageObject`] with stable field names.
#[derive(Clone, Debug, Serialize)]
pub struct ObjectRecord<'a> {
    pub object_type: ObjectType,
    pub page_number: usize,
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
    pub top: f64,
    pub bottom: f64,
    pub doctop: f64,
    pub width: f64,
    pub height: f64,
    #[serde(flatten)]
    pub attrs: ObjectAttrs<'a>,
}

/// Variant-specific fields of an [`ObjectRecord`].
#[derive(Clone, Debug, Serialize)]
#[serde(untagged)]
pub enum ObjectAttrs<'a> {
    Char {
        text: &'a str,
        fontname: &'a str,
        size: f64,
        upright: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        stroking_color: Option<&'a [f64]>,
        #[serde(skip_serializing_if = "Option::is_none")]
        non_stroking_color: Option<&'a [f64]>,
    },
    Path {
        linewidth: f64,
        stroke: bool,
        fill: bool,
        #[serde(skip_serializing_if = "<[Point]>::is_empty")]
        pts: &'a [Point],
    },
    Image {
        name: &'a str,
        #[serde(skip_serializing_if = "Option::is_none")]
        srcsize: Option<(u32, u32)>,
    },
    Annotation {
        #[serde(skip_serializing_if = "Option::is_none")]
        uri: Option<&'a str>,
        #[serde(skip_serializing_if = "Option::is_none")]
        title: Option<&'a str>,
        #[serde(skip_serializing_if = "Option::is_none")]
        contents: Option<&'a str>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glyph_round_trips_through_tagged_json() {
        let json = r#"{"object_type":"char","page_number":1,"x0":1,"top":2,"x1":6,"bottom":12,
                       "doctop":2,"text":"A","fontname":"F1","size":10}"#;
        let obj: PageObject = serde_json::from_str(json).unwrap();
        let glyph = obj.as_glyph().unwrap();
        assert_eq!(glyph.text, "A");
        assert!(glyph.upright);
        assert_eq!(glyph.bbox, BBox::new(1.0, 2.0, 6.0, 12.0).unwrap());
    }

    #[test]
    fn inverted_object_bbox_is_rejected() {
        let json = r#"{"object_type":"rect","page_number":1,"x0":10,"top":2,"x1":6,"bottom":12,
                       "doctop":2}"#;
        assert!(serde_json::from_str::<PageObject>(json).is_err());
    }

    #[test]
    fn record_exposes_stable_field_names() {
        let g = Glyph::new(3, BBox::new(10.0, 20.0, 15.0, 30.0).unwrap(), "x", "F", 9.0)
            .with_doctop(820.0);
        let obj = PageObject::from(g);
        let value = serde_json::to_value(obj.record(100.0)).unwrap();
        assert_eq!(value["object_type"], "char");
        assert_eq!(value["page_number"], 3);
        assert_eq!(value["y0"], 70.0);
        assert_eq!(value["y1"], 80.0);
        assert_eq!(value["doctop"], 820.0);
        assert_eq!(value["width"], 5.0);
        assert_eq!(value["height"], 10.0);
        assert_eq!(value["text"], "x");
        assert_eq!(value["fontname"], "F");
        assert!(value.get("stroking_color").is_none());
    }

    #[test]
    fn path_record_carries_only_path_fields() {
        let rect = PageObject::Rect(PathObject::new(1, BBox::new(0.0, 0.0, 5.0, 5.0).unwrap()));
        let value = serde_json::to_value(rect.record(5.0)).unwrap();
        assert_eq!(value["object_type"], "rect");
        assert_eq!(value["linewidth"], 1.0);
        assert!(value.get("text").is_none());
        assert!(value.get("pts").is_none());
    }
}
