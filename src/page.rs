//! Headless page - an in-memory [`FieldHost`].
//!
//! Models just enough of a document for the engine: tagged elements with
//! attributes and a bounding box, plain controls (value + selection),
//! rich-text regions (formatted text nodes + caret), focus, and the single
//! suggestion overlay. Used by the CLI and by tests.

use std::collections::{BTreeMap, HashMap};

use crate::error::FieldError;
use crate::field::{
    utf16, CaretRun, FieldEvent, FieldKind, FieldRef, PlainEditable, RichEditable,
};
use crate::host::{ElementId, FieldHost, Rect, Viewport};
use crate::panel::PanelView;

/// A plain input or textarea
#[derive(Debug, Clone, Default)]
pub struct PlainControl {
    value: String,
    selection: Option<(usize, usize)>,
    focused: bool,
    events: Vec<FieldEvent>,
}

impl PlainControl {
    pub fn new(value: &str) -> Self {
        let end = utf16::len(value);
        Self {
            value: value.to_string(),
            selection: Some((end, end)),
            ..Default::default()
        }
    }

    pub fn selection(&self) -> Option<(usize, usize)> {
        self.selection
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    /// Events dispatched on this control, oldest first
    pub fn events(&self) -> &[FieldEvent] {
        &self.events
    }

    /// Insert text at the caret the way a keystroke would
    fn type_text(&mut self, text: &str) {
        let caret = self.selection.map(|(start, _)| start).unwrap_or(0);
        let end = self.selection.map(|(_, end)| end).unwrap_or(caret);
        self.value = utf16::splice(&self.value, caret, end.saturating_sub(caret), text);
        let caret = caret + utf16::len(text);
        self.selection = Some((caret, caret));
    }
}

impl PlainEditable for PlainControl {
    fn value(&self) -> &str {
        &self.value
    }

    fn selection_start(&self) -> Option<usize> {
        self.selection.map(|(start, _)| start)
    }

    fn set_value(&mut self, value: String) {
        self.value = value;
        // Assigning a value moves the selection to the end, as browsers do
        let end = utf16::len(&self.value);
        self.selection = Some((end, end));
    }

    fn set_selection_range(&mut self, start: usize, end: usize) {
        let len = utf16::len(&self.value);
        self.selection = Some((start.min(len), end.min(len)));
    }

    fn focus(&mut self) {
        self.focused = true;
    }

    fn dispatch(&mut self, event: FieldEvent) {
        self.events.push(event);
    }
}

/// One run of text inside a rich-text region
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextNode {
    pub text: String,
    /// Formatting wrapper, e.g. `"b"` for bold
    pub mark: Option<String>,
}

impl TextNode {
    pub fn plain(text: &str) -> Self {
        Self {
            text: text.to_string(),
            mark: None,
        }
    }

    pub fn marked(text: &str, mark: &str) -> Self {
        Self {
            text: text.to_string(),
            mark: Some(mark.to_string()),
        }
    }
}

/// Caret position: a text node index and a UTF-16 offset inside it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DomPoint {
    pub node: usize,
    pub offset: usize,
}

/// A contenteditable region
#[derive(Debug, Clone)]
pub struct RichTextBlock {
    nodes: Vec<TextNode>,
    caret: Option<DomPoint>,
    edit_commands: bool,
    /// Deletes accepted before editing commands start failing
    delete_limit: Option<usize>,
    events: Vec<FieldEvent>,
}

impl RichTextBlock {
    /// Region with the caret at the end of the last node
    pub fn new(nodes: Vec<TextNode>) -> Self {
        let nodes = if nodes.is_empty() {
            vec![TextNode::plain("")]
        } else {
            nodes
        };
        let last = nodes.len() - 1;
        let caret = DomPoint {
            node: last,
            offset: utf16::len(&nodes[last].text),
        };
        Self {
            nodes,
            caret: Some(caret),
            edit_commands: true,
            delete_limit: None,
            events: Vec::new(),
        }
    }

    /// Disable delete/insert editing commands
    pub fn without_edit_commands(mut self) -> Self {
        self.edit_commands = false;
        self
    }

    /// Reject delete commands after the first `deletes` succeed
    pub fn failing_after_deletes(mut self, deletes: usize) -> Self {
        self.delete_limit = Some(deletes);
        self
    }

    pub fn nodes(&self) -> &[TextNode] {
        &self.nodes
    }

    pub fn caret(&self) -> Option<DomPoint> {
        self.caret
    }

    pub fn set_caret(&mut self, caret: Option<DomPoint>) {
        self.caret = caret.map(|point| self.clamp(point));
    }

    pub fn events(&self) -> &[FieldEvent] {
        &self.events
    }

    fn clamp(&self, point: DomPoint) -> DomPoint {
        let node = point.node.min(self.nodes.len() - 1);
        let offset = point.offset.min(utf16::len(&self.nodes[node].text));
        DomPoint { node, offset }
    }

    fn insert_at_caret(&mut self, text: &str) -> Result<(), FieldError> {
        let caret = self.caret.ok_or(FieldError::NoCaret)?;
        let node = &mut self.nodes[caret.node];
        node.text = utf16::splice(&node.text, caret.offset, 0, text);
        self.caret = Some(DomPoint {
            node: caret.node,
            offset: caret.offset + utf16::len(text),
        });
        Ok(())
    }
}

impl RichEditable for RichTextBlock {
    fn text_content(&self) -> String {
        self.nodes.iter().map(|node| node.text.as_str()).collect()
    }

    fn caret_offset(&self) -> Option<usize> {
        let caret = self.caret?;
        let before: usize = self.nodes[..caret.node]
            .iter()
            .map(|node| utf16::len(&node.text))
            .sum();
        Some(before + caret.offset)
    }

    fn caret_run(&self) -> Option<CaretRun> {
        let caret = self.caret?;
        Some(CaretRun {
            text: self.nodes[caret.node].text.clone(),
            offset: caret.offset,
        })
    }

    fn splice_caret_run(
        &mut self,
        start: usize,
        end: usize,
        text: &str,
    ) -> Result<(), FieldError> {
        let caret = self.caret.ok_or(FieldError::NoCaret)?;
        let node = &mut self.nodes[caret.node];
        node.text = utf16::splice(&node.text, start, end.saturating_sub(start), text);
        self.caret = Some(DomPoint {
            node: caret.node,
            offset: start + utf16::len(text),
        });
        Ok(())
    }

    fn supports_edit_commands(&self) -> bool {
        self.edit_commands
    }

    fn delete_backward(&mut self) -> Result<(), FieldError> {
        if !self.edit_commands {
            return Err(FieldError::EditCommandsUnavailable);
        }
        match self.delete_limit {
            Some(0) => return Err(FieldError::EditCommandsUnavailable),
            Some(ref mut remaining) => *remaining -= 1,
            None => {}
        }
        let mut caret = self.caret.ok_or(FieldError::NoCaret)?;

        // Step back over empty or exhausted nodes
        while caret.offset == 0 && caret.node > 0 {
            caret.node -= 1;
            caret.offset = utf16::len(&self.nodes[caret.node].text);
        }

        let node = &mut self.nodes[caret.node];
        let idx = utf16::byte_index(&node.text, caret.offset);
        if let Some(ch) = node.text[..idx].chars().next_back() {
            node.text.replace_range(idx - ch.len_utf8()..idx, "");
            caret.offset -= ch.len_utf16();
        }
        self.caret = Some(caret);
        Ok(())
    }

    fn insert_text(&mut self, text: &str) -> Result<(), FieldError> {
        if !self.edit_commands {
            return Err(FieldError::EditCommandsUnavailable);
        }
        self.insert_at_caret(text)
    }

    fn set_text_content(&mut self, text: String, caret: usize) {
        let offset = caret.min(utf16::len(&text));
        self.nodes = vec![TextNode { text, mark: None }];
        self.caret = Some(DomPoint { node: 0, offset });
    }

    fn dispatch(&mut self, event: FieldEvent) {
        self.events.push(event);
    }
}

/// What an element holds
#[derive(Debug, Clone)]
pub enum ElementContent {
    Static,
    Plain(PlainControl),
    Rich(RichTextBlock),
}

#[derive(Debug, Clone)]
pub struct Element {
    tag: String,
    attributes: BTreeMap<String, String>,
    rect: Rect,
    content: ElementContent,
}

/// In-memory document
#[derive(Debug, Default)]
pub struct Page {
    elements: HashMap<ElementId, Element>,
    next_id: u64,
    active: Option<ElementId>,
    viewport: Viewport,
    panel: Option<PanelView>,
    panel_renders: usize,
}

impl Page {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_viewport(viewport: Viewport) -> Self {
        Self {
            viewport,
            ..Self::default()
        }
    }

    /// Add an arbitrary element
    pub fn add_element(
        &mut self,
        tag: &str,
        attributes: &[(&str, &str)],
        rect: Rect,
        content: ElementContent,
    ) -> ElementId {
        self.next_id += 1;
        let id = ElementId(self.next_id);
        let element = Element {
            tag: tag.to_ascii_lowercase(),
            attributes: attributes
                .iter()
                .map(|(name, value)| (name.to_ascii_lowercase(), value.to_string()))
                .collect(),
            rect,
            content,
        };
        self.elements.insert(id, element);
        id
    }

    pub fn add_textarea(&mut self, value: &str) -> ElementId {
        self.add_element(
            "textarea",
            &[],
            Rect::new(20.0, 40.0, 400.0, 120.0),
            ElementContent::Plain(PlainControl::new(value)),
        )
    }

    pub fn add_input(&mut self, input_type: &str, value: &str) -> ElementId {
        self.add_element(
            "input",
            &[("type", input_type)],
            Rect::new(20.0, 40.0, 300.0, 28.0),
            ElementContent::Plain(PlainControl::new(value)),
        )
    }

    pub fn add_contenteditable(&mut self, block: RichTextBlock) -> ElementId {
        self.add_element(
            "div",
            &[("contenteditable", "true")],
            Rect::new(20.0, 200.0, 480.0, 160.0),
            ElementContent::Rich(block),
        )
    }

    pub fn set_rect(&mut self, id: ElementId, rect: Rect) {
        if let Some(element) = self.elements.get_mut(&id) {
            element.rect = rect;
        }
    }

    pub fn focus(&mut self, id: ElementId) {
        if let Some(ElementContent::Plain(control)) =
            self.elements.get_mut(&id).map(|el| &mut el.content)
        {
            control.focused = true;
        }
        self.active = Some(id);
    }

    pub fn blur(&mut self) {
        if let Some(ElementContent::Plain(control)) = self
            .active
            .and_then(|id| self.elements.get_mut(&id))
            .map(|el| &mut el.content)
        {
            control.focused = false;
        }
        self.active = None;
    }

    pub fn remove(&mut self, id: ElementId) {
        self.elements.remove(&id);
        if self.active == Some(id) {
            self.active = None;
        }
    }

    /// Insert text at the element's caret, as typing would
    pub fn type_text(&mut self, id: ElementId, text: &str) {
        match self.elements.get_mut(&id).map(|el| &mut el.content) {
            Some(ElementContent::Plain(control)) => control.type_text(text),
            Some(ElementContent::Rich(block)) => {
                // Typing never depends on editing-command support
                let _ = block.insert_at_caret(text);
            }
            _ => {}
        }
    }

    pub fn plain(&self, id: ElementId) -> Option<&PlainControl> {
        match self.elements.get(&id).map(|el| &el.content) {
            Some(ElementContent::Plain(control)) => Some(control),
            _ => None,
        }
    }

    pub fn plain_mut(&mut self, id: ElementId) -> Option<&mut PlainControl> {
        match self.elements.get_mut(&id).map(|el| &mut el.content) {
            Some(ElementContent::Plain(control)) => Some(control),
            _ => None,
        }
    }

    pub fn rich(&self, id: ElementId) -> Option<&RichTextBlock> {
        match self.elements.get(&id).map(|el| &el.content) {
            Some(ElementContent::Rich(block)) => Some(block),
            _ => None,
        }
    }

    pub fn rich_mut(&mut self, id: ElementId) -> Option<&mut RichTextBlock> {
        match self.elements.get_mut(&id).map(|el| &mut el.content) {
            Some(ElementContent::Rich(block)) => Some(block),
            _ => None,
        }
    }

    /// Current text of a field, whichever kind it is
    pub fn text_of(&self, id: ElementId) -> Option<String> {
        match self.elements.get(&id).map(|el| &el.content) {
            Some(ElementContent::Plain(control)) => Some(control.value.clone()),
            Some(ElementContent::Rich(block)) => Some(block.text_content()),
            _ => None,
        }
    }

    /// The suggestion overlay as last rendered
    pub fn panel(&self) -> Option<&PanelView> {
        self.panel.as_ref()
    }

    /// Number of times the overlay was shown or updated
    pub fn panel_renders(&self) -> usize {
        self.panel_renders
    }
}

impl FieldHost for Page {
    fn is_attached(&self, id: ElementId) -> bool {
        self.elements.contains_key(&id)
    }

    fn tag_name(&self, id: ElementId) -> Option<&str> {
        self.elements.get(&id).map(|el| el.tag.as_str())
    }

    fn attribute(&self, id: ElementId, name: &str) -> Option<&str> {
        self.elements
            .get(&id)
            .and_then(|el| el.attributes.get(name))
            .map(String::as_str)
    }

    fn active_element(&self) -> Option<ElementId> {
        self.active
    }

    fn field_kind(&self, id: ElementId) -> Option<FieldKind> {
        match self.elements.get(&id).map(|el| &el.content) {
            Some(ElementContent::Plain(_)) => Some(FieldKind::Plain),
            Some(ElementContent::Rich(_)) => Some(FieldKind::RichText),
            _ => None,
        }
    }

    fn field(&mut self, id: ElementId) -> Option<FieldRef<'_>> {
        match self.elements.get_mut(&id).map(|el| &mut el.content) {
            Some(ElementContent::Plain(control)) => Some(FieldRef::Plain(control)),
            Some(ElementContent::Rich(block)) => Some(FieldRef::RichText(block)),
            _ => None,
        }
    }

    fn bounding_rect(&self, id: ElementId) -> Option<Rect> {
        self.elements.get(&id).map(|el| el.rect)
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn render_panel(&mut self, view: Option<&PanelView>) {
        if view.is_some() {
            self.panel_renders += 1;
        }
        self.panel = view.cloned();
    }
}
