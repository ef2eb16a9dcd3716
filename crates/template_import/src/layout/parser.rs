//! Layout document parsing with quick-xml
//!
//! The document is deserialized into private `Raw*` mirrors of the schema
//! first. Every leaf field accepts an attribute (`@Name`) or a child element
//! of the same name, and unknown elements are ignored. The raw tree is then
//! checked for required structure and converted into the public schema.
//!
//! The deserializer trims text content, so the widget `Type`, `Text` and
//! `NavigationType` elements are read a second time with the event reader and
//! their content is kept as written.

use super::schema::{
    Column, Layout, LayoutSchema, LayoutWidget, Metadata, MetadataItem, Placeholder, Widget,
    WidgetKind, WidgetProperties,
};
use crate::{SchemaError, SchemaResult};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Default, Deserialize)]
struct RawTemplate {
    #[serde(rename = "Metadata")]
    metadata: Option<RawMetadata>,
    #[serde(rename = "Layout")]
    layout: Option<RawLayout>,
}

#[derive(Debug, Default, Deserialize)]
struct RawMetadata {
    #[serde(rename = "MetadataItems")]
    items: Option<RawMetadataItems>,
}

#[derive(Debug, Default, Deserialize)]
struct RawMetadataItems {
    #[serde(rename = "MetadataItem", default)]
    items: Vec<RawMetadataItem>,
}

#[derive(Debug, Default, Deserialize)]
struct RawMetadataItem {
    #[serde(rename = "Id", alias = "@Id")]
    id: Option<String>,
    #[serde(rename = "Value", alias = "@Value")]
    value: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawLayout {
    #[serde(rename = "Placeholders")]
    placeholders: Option<RawPlaceholders>,
}

#[derive(Debug, Default, Deserialize)]
struct RawPlaceholders {
    #[serde(rename = "Placeholder", default)]
    items: Vec<RawPlaceholder>,
}

#[derive(Debug, Default, Deserialize)]
struct RawPlaceholder {
    #[serde(rename = "LayoutWidget")]
    layout_widget: Option<RawLayoutWidget>,
}

#[derive(Debug, Default, Deserialize)]
struct RawLayoutWidget {
    #[serde(rename = "Columns")]
    columns: Option<RawColumns>,
}

#[derive(Debug, Default, Deserialize)]
struct RawColumns {
    #[serde(rename = "Column", default)]
    items: Vec<RawColumn>,
}

#[derive(Debug, Default, Deserialize)]
struct RawColumn {
    #[serde(rename = "Widget")]
    widget: Option<RawWidget>,
}

#[derive(Debug, Default, Deserialize)]
struct RawWidget {
    #[serde(rename = "Type", alias = "@Type")]
    type_name: Option<String>,
    #[serde(rename = "CssClass", alias = "@CssClass")]
    css_class: Option<String>,
    #[serde(rename = "SfID", alias = "@SfID")]
    sf_id: Option<String>,
    #[serde(rename = "Properties")]
    properties: Option<RawProperties>,
}

#[derive(Debug, Default, Deserialize)]
struct RawProperties {
    #[serde(rename = "Text", alias = "@Text")]
    text: Option<String>,
    #[serde(rename = "Filename", alias = "@Filename")]
    filename: Option<String>,
    #[serde(rename = "NavigationType", alias = "@NavigationType")]
    navigation_type: Option<String>,
}

/// Parse a layout document.
///
/// Returns `Ok(None)` when the document has no root element or its root is
/// marked `xsi:nil="true"`. That is "no template", which is different from a
/// malformed document.
pub fn parse_layout(content: &str) -> SchemaResult<Option<LayoutSchema>> {
    let content = content.trim_start_matches('\u{feff}');

    if !has_root_element(content)? {
        debug!("layout document has no template");
        return Ok(None);
    }

    let raw: RawTemplate = quick_xml::de::from_str(content)?;
    let leaves = widget_leaves(content)?;
    convert(raw, &leaves).map(Some)
}

/// Read and parse the layout document at `path`
pub fn parse_layout_file(path: &Path) -> SchemaResult<Option<LayoutSchema>> {
    if !path.is_file() {
        return Err(SchemaError::MissingLayout(path.to_path_buf()));
    }

    let bytes = std::fs::read(path)?;
    let content = decode(&bytes)?;
    parse_layout(&content)
}

/// Decode UTF-8, or UTF-16 when the document starts with a UTF-16 BOM
fn decode(bytes: &[u8]) -> SchemaResult<String> {
    let utf16 = |be: bool| -> SchemaResult<String> {
        let units: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|pair| {
                if be {
                    u16::from_be_bytes([pair[0], pair[1]])
                } else {
                    u16::from_le_bytes([pair[0], pair[1]])
                }
            })
            .collect();
        String::from_utf16(&units).map_err(|e| SchemaError::Xml(e.to_string()))
    };

    match bytes {
        [0xFF, 0xFE, ..] => utf16(false),
        [0xFE, 0xFF, ..] => utf16(true),
        _ => String::from_utf8(bytes.to_vec()).map_err(|e| SchemaError::Xml(e.to_string())),
    }
}

/// Scan up to the root element and check that it carries a template
fn has_root_element(content: &str) -> SchemaResult<bool> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) => return Ok(!is_nil(&e)?),
            Event::Text(t) if !t.is_empty() => {
                return Err(SchemaError::Xml("text outside of root element".to_string()))
            }
            Event::Eof => return Ok(false),
            _ => {}
        }
    }
}

fn is_nil(start: &BytesStart) -> SchemaResult<bool> {
    for attr in start.attributes() {
        let attr = attr?;
        let key = attr.key;
        let nil_key = key.local_name().as_ref() == b"nil"
            && key.prefix().is_some_and(|p| p.as_ref() == b"xsi");
        if nil_key {
            return Ok(String::from_utf8_lossy(&attr.value).trim() == "true");
        }
    }
    Ok(false)
}

/// Placeholder and column index of a widget
type WidgetSlot = (usize, usize);

/// Element path from the root to a widget
const WIDGET_PATH: [&[u8]; 7] = [
    b"Layout",
    b"Placeholders",
    b"Placeholder",
    b"LayoutWidget",
    b"Columns",
    b"Column",
    b"Widget",
];

/// Depth of `Placeholder` and `Column` below the root
const PLACEHOLDER_DEPTH: usize = 3;
const COLUMN_DEPTH: usize = 6;

/// Widget leaves written as elements, content kept as written
#[derive(Debug, Default)]
struct WidgetLeaves {
    type_name: Option<String>,
    text: Option<String>,
    navigation_type: Option<String>,
}

impl WidgetLeaves {
    fn is_leaf(below_widget: &[Vec<u8>]) -> bool {
        WidgetLeaves::default().slot(below_widget).is_some()
    }

    fn slot(&mut self, below_widget: &[Vec<u8>]) -> Option<&mut Option<String>> {
        match below_widget {
            [leaf] if leaf.as_slice() == b"Type" => Some(&mut self.type_name),
            [props, leaf] if props.as_slice() == b"Properties" => match leaf.as_slice() {
                b"Text" => Some(&mut self.text),
                b"NavigationType" => Some(&mut self.navigation_type),
                _ => None,
            },
            _ => None,
        }
    }
}

/// Read widget leaf elements with the event reader, without trimming
fn widget_leaves(content: &str) -> SchemaResult<HashMap<WidgetSlot, WidgetLeaves>> {
    let mut reader = Reader::from_str(content);
    let mut stack: Vec<Vec<u8>> = Vec::new();
    let mut placeholders = 0usize;
    let mut columns = 0usize;
    let mut current: Option<String> = None;
    let mut leaves: HashMap<WidgetSlot, WidgetLeaves> = HashMap::new();

    // Open elements below the root start with `depth` entries of WIDGET_PATH
    let on_path = |stack: &[Vec<u8>], depth: usize| {
        stack.len() > depth
            && stack[1..=depth]
                .iter()
                .zip(WIDGET_PATH.iter())
                .all(|(open, expected)| open.as_slice() == *expected)
    };
    let widget_end = WIDGET_PATH.len() + 1;
    let is_leaf = |stack: &[Vec<u8>]| {
        stack.len() > widget_end
            && on_path(stack, WIDGET_PATH.len())
            && WidgetLeaves::is_leaf(&stack[widget_end..])
    };

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                stack.push(e.local_name().as_ref().to_vec());
                if stack.len() == PLACEHOLDER_DEPTH + 1 && on_path(&stack, PLACEHOLDER_DEPTH) {
                    placeholders += 1;
                    columns = 0;
                } else if stack.len() == COLUMN_DEPTH + 1 && on_path(&stack, COLUMN_DEPTH) {
                    columns += 1;
                } else if is_leaf(&stack) {
                    current = Some(String::new());
                }
            }
            Event::Empty(e) => {
                stack.push(e.local_name().as_ref().to_vec());
                if stack.len() == PLACEHOLDER_DEPTH + 1 && on_path(&stack, PLACEHOLDER_DEPTH) {
                    placeholders += 1;
                    columns = 0;
                } else if stack.len() == COLUMN_DEPTH + 1 && on_path(&stack, COLUMN_DEPTH) {
                    columns += 1;
                }
                stack.pop();
            }
            Event::Text(t) => {
                if let Some(value) = current.as_mut() {
                    value.push_str(&t.unescape()?);
                }
            }
            Event::CData(c) => {
                if let Some(value) = current.as_mut() {
                    value.push_str(&String::from_utf8_lossy(&c.into_inner()));
                }
            }
            Event::End(_) => {
                if !is_leaf(&stack) {
                    stack.pop();
                    continue;
                }
                if let Some(value) = current.take() {
                    if placeholders > 0 && columns > 0 {
                        let entry = leaves.entry((placeholders - 1, columns - 1)).or_default();
                        if let Some(slot) = entry.slot(&stack[widget_end..]) {
                            *slot = Some(value);
                        }
                    }
                }
                stack.pop();
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(leaves)
}

fn convert(raw: RawTemplate, leaves: &HashMap<WidgetSlot, WidgetLeaves>) -> SchemaResult<LayoutSchema> {
    let metadata = raw.metadata.map(|m| Metadata {
        items: m
            .items
            .map(|items| items.items)
            .unwrap_or_default()
            .into_iter()
            .map(|item| MetadataItem {
                id: item.id.unwrap_or_default(),
                value: item.value.unwrap_or_default(),
            })
            .collect(),
    });

    let layout = raw
        .layout
        .map(|layout| convert_layout(layout, leaves))
        .transpose()?;

    Ok(LayoutSchema { metadata, layout })
}

fn convert_layout(raw: RawLayout, leaves: &HashMap<WidgetSlot, WidgetLeaves>) -> SchemaResult<Layout> {
    let placeholders = raw
        .placeholders
        .map(|p| p.items)
        .unwrap_or_default()
        .into_iter()
        .enumerate()
        .map(|(index, placeholder)| {
            let layout_widget = placeholder.layout_widget.ok_or_else(|| {
                SchemaError::MissingElement(format!("Placeholder[{}]/LayoutWidget", index))
            })?;
            Ok(Placeholder {
                layout_widget: convert_layout_widget(layout_widget, index, leaves),
            })
        })
        .collect::<SchemaResult<Vec<_>>>()?;

    Ok(Layout { placeholders })
}

fn convert_layout_widget(
    raw: RawLayoutWidget,
    placeholder: usize,
    leaves: &HashMap<WidgetSlot, WidgetLeaves>,
) -> LayoutWidget {
    let columns = raw
        .columns
        .map(|c| c.items)
        .unwrap_or_default()
        .into_iter()
        .enumerate()
        .map(|(column, raw)| Column {
            widget: raw
                .widget
                .map(|widget| convert_widget(widget, leaves.get(&(placeholder, column)))),
        })
        .collect();

    LayoutWidget { columns }
}

/// Element-form leaves in `leaves` replace the trimmed deserialized values
fn convert_widget(raw: RawWidget, leaves: Option<&WidgetLeaves>) -> Widget {
    let keep = |parsed: Option<String>, written: Option<&Option<String>>| match written {
        Some(Some(value)) if parsed.is_some() => Some(value.clone()),
        _ => parsed,
    };

    Widget {
        kind: WidgetKind::parse(keep(raw.type_name, leaves.map(|l| &l.type_name)).as_deref()),
        css_class: raw.css_class.unwrap_or_default(),
        sf_id: raw.sf_id.unwrap_or_default(),
        properties: raw.properties.map(|p| WidgetProperties {
            text: keep(p.text, leaves.map(|l| &l.text)),
            filename: p.filename,
            navigation_type: keep(p.navigation_type, leaves.map(|l| &l.navigation_type)),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CORPORATE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<Template xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
  <Metadata>
    <MetadataItems>
      <MetadataItem Id="author" Value="Design Team" />
      <MetadataItem><Id>title</Id><Value>Corporate</Value></MetadataItem>
    </MetadataItems>
  </Metadata>
  <Layout>
    <Placeholders>
      <Placeholder>
        <LayoutWidget>
          <Columns>
            <Column>
              <Widget>
                <Type>Content Block</Type>
                <CssClass>intro</CssClass>
                <SfID>Content</SfID>
                <Properties><Text>&lt;p&gt;Hello&lt;/p&gt;</Text></Properties>
              </Widget>
            </Column>
            <Column />
          </Columns>
        </LayoutWidget>
      </Placeholder>
      <Placeholder>
        <LayoutWidget>
          <Columns>
            <Column>
              <Widget Type="Navigation" CssClass="menu" SfID="Nav">
                <Properties NavigationType="tabscontrol" />
              </Widget>
            </Column>
          </Columns>
        </LayoutWidget>
        <Extra>ignored</Extra>
      </Placeholder>
    </Placeholders>
  </Layout>
</Template>"#;

    #[test]
    fn test_parse_full_document() {
        let schema = parse_layout(CORPORATE).unwrap().unwrap();
        assert_eq!(schema.template_name().unwrap(), "Corporate");

        let metadata = schema.metadata.as_ref().unwrap();
        assert_eq!(metadata.items.len(), 2);
        assert_eq!(metadata.get("author"), Some("Design Team"));

        let layout = schema.layout.as_ref().unwrap();
        assert_eq!(layout.placeholders.len(), 2);
        assert_eq!(layout.placeholders[0].layout_widget.columns.len(), 2);

        let widgets: Vec<_> = layout.widgets().collect();
        assert_eq!(widgets.len(), 2);

        let (_, block) = widgets[0];
        assert_eq!(block.kind, WidgetKind::ContentBlock);
        assert_eq!(block.css_class, "intro");
        assert_eq!(block.sf_id, "Content");
        assert_eq!(block.text(), "<p>Hello</p>");

        let (position, nav) = widgets[1];
        assert_eq!(position.placeholder, 1);
        assert_eq!(nav.kind, WidgetKind::Navigation);
        assert_eq!(nav.css_class, "menu");
        assert_eq!(nav.navigation_type(), Some("tabscontrol"));
    }

    #[test]
    fn test_optional_subtrees_may_be_absent() {
        let schema = parse_layout("<Template />").unwrap().unwrap();
        assert_eq!(schema, LayoutSchema::default());
        assert_eq!(schema.template_name().unwrap(), "untitled");

        let schema = parse_layout("<Template><Metadata /></Template>")
            .unwrap()
            .unwrap();
        assert_eq!(schema.metadata, Some(Metadata::default()));
        assert!(schema.layout.is_none());
    }

    #[test]
    fn test_widget_text_keeps_whitespace() {
        let xml = r#"<Template><Layout><Placeholders>
            <Placeholder><LayoutWidget><Columns>
                <Column />
                <Column><Widget><Type>Content Block</Type>
                    <Properties><Text>  padded  </Text></Properties>
                </Widget></Column>
                <Column><Widget><Type> Navigation</Type><SfID>Nav</SfID>
                    <Properties><NavigationType>tabscontrol </NavigationType></Properties>
                </Widget></Column>
            </Columns></LayoutWidget></Placeholder>
            <Placeholder><LayoutWidget><Columns>
                <Column><Widget Type="Content Block">
                    <Properties><Text>
  &lt;p&gt;two&lt;/p&gt;
</Text></Properties>
                </Widget></Column>
            </Columns></LayoutWidget></Placeholder>
        </Placeholders></Layout></Template>"#;

        let schema = parse_layout(xml).unwrap().unwrap();
        let layout = schema.layout.unwrap();
        let texts: Vec<(String, &str)> = layout
            .widgets()
            .map(|(position, widget)| (position.to_string(), widget.text()))
            .collect();
        assert_eq!(
            texts,
            vec![
                ("P0C1".to_string(), "  padded  "),
                ("P0C2".to_string(), ""),
                ("P1C0".to_string(), "\n  <p>two</p>\n"),
            ]
        );

        let (_, nav) = layout.widgets().find(|(_, w)| w.sf_id == "Nav").unwrap();
        assert_eq!(nav.kind, WidgetKind::Unknown(" Navigation".to_string()));
        assert_eq!(nav.navigation_type(), Some("tabscontrol "));
    }

    #[test]
    fn test_widget_without_properties() {
        let xml = r#"<Template><Layout><Placeholders><Placeholder><LayoutWidget><Columns>
            <Column><Widget Type="Image" SfID="Logo" /></Column>
        </Columns></LayoutWidget></Placeholder></Placeholders></Layout></Template>"#;

        let schema = parse_layout(xml).unwrap().unwrap();
        let layout = schema.layout.unwrap();
        let (_, widget) = layout.widgets().next().unwrap();
        assert_eq!(widget.kind, WidgetKind::Image);
        assert_eq!(widget.filename(), None);
        assert_eq!(widget.text(), "");
    }

    #[test]
    fn test_placeholder_requires_layout_widget() {
        let xml = "<Template><Layout><Placeholders><Placeholder /></Placeholders></Layout></Template>";
        match parse_layout(xml) {
            Err(SchemaError::MissingElement(name)) => {
                assert_eq!(name, "Placeholder[0]/LayoutWidget")
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_empty_and_nil_documents() {
        assert_eq!(parse_layout("").unwrap(), None);
        assert_eq!(parse_layout("  \n ").unwrap(), None);
        assert_eq!(
            parse_layout(r#"<?xml version="1.0" encoding="utf-8"?>"#).unwrap(),
            None
        );
        let nil = r#"<Template xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xsi:nil="true" />"#;
        assert_eq!(parse_layout(nil).unwrap(), None);
    }

    #[test]
    fn test_malformed_document() {
        assert!(matches!(
            parse_layout("<Template><Metadata></Template>"),
            Err(SchemaError::Xml(_))
        ));
        assert!(matches!(parse_layout("not xml"), Err(SchemaError::Xml(_))));
    }

    #[test]
    fn test_parse_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("layout.xml");
        assert!(matches!(
            parse_layout_file(&path),
            Err(SchemaError::MissingLayout(_))
        ));

        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice(CORPORATE.as_bytes());
        std::fs::write(&path, bytes).unwrap();
        let schema = parse_layout_file(&path).unwrap().unwrap();
        assert_eq!(schema.template_name().unwrap(), "Corporate");
    }

    #[test]
    fn test_parse_utf16_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("layout.xml");

        let xml = r#"<Template><Metadata><MetadataItems><MetadataItem Id="title" Value="Wide" /></MetadataItems></Metadata></Template>"#;
        let mut bytes = vec![0xFF, 0xFE];
        for unit in xml.encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        std::fs::write(&path, bytes).unwrap();

        let schema = parse_layout_file(&path).unwrap().unwrap();
        assert_eq!(schema.template_name().unwrap(), "Wide");
    }
}
