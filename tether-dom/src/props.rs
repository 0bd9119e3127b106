/// Value of a live element property.
#[derive(Debug, Clone, PartialEq)]
pub enum PropValue {
    Null,
    Bool(bool),
    Str(String),
}

impl PropValue {
    pub fn is_truthy(&self) -> bool {
        match self {
            PropValue::Null => false,
            PropValue::Bool(b) => *b,
            PropValue::Str(s) => !s.is_empty(),
        }
    }

    pub fn to_text(&self) -> String {
        match self {
            PropValue::Null => String::new(),
            PropValue::Bool(b) => b.to_string(),
            PropValue::Str(s) => s.clone(),
        }
    }
}

impl From<bool> for PropValue {
    fn from(b: bool) -> Self {
        PropValue::Bool(b)
    }
}

impl From<&str> for PropValue {
    fn from(s: &str) -> Self {
        PropValue::Str(s.to_string())
    }
}

impl From<String> for PropValue {
    fn from(s: String) -> Self {
        PropValue::Str(s)
    }
}

impl<T: Into<PropValue>> From<Option<T>> for PropValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(PropValue::Null)
    }
}

/// How a property relates to the element's markup attributes.
pub(crate) enum Reflect {
    /// Current state: defaults to the attribute, then diverges once written.
    State { attr: &'static str, boolean: bool },
    /// Always mirrors the attribute; boolean ones by presence.
    Attr { attr: &'static str, boolean: bool },
}

pub(crate) fn reflection(prop: &str) -> Option<Reflect> {
    fn state(attr: &'static str, boolean: bool) -> Option<Reflect> {
        Some(Reflect::State { attr, boolean })
    }
    fn attr(attr: &'static str, boolean: bool) -> Option<Reflect> {
        Some(Reflect::Attr { attr, boolean })
    }
    match prop {
        "value" => state("value", false),
        "checked" => state("checked", true),
        "selected" => state("selected", true),
        "defaultValue" => attr("value", false),
        "defaultChecked" => attr("checked", true),
        "defaultSelected" => attr("selected", true),
        "disabled" => attr("disabled", true),
        "readOnly" => attr("readonly", true),
        "className" => attr("class", false),
        "htmlFor" => attr("for", false),
        "tabIndex" => attr("tabindex", false),
        "maxLength" => attr("maxlength", false),
        "cellSpacing" => attr("cellspacing", false),
        "cellPadding" => attr("cellpadding", false),
        "rowSpan" => attr("rowspan", false),
        "colSpan" => attr("colspan", false),
        "useMap" => attr("usemap", false),
        "frameBorder" => attr("frameborder", false),
        "contentEditable" => attr("contenteditable", false),
        "encoding" => attr("enctype", false),
        "type" => attr("type", false),
        "id" => attr("id", false),
        "title" => attr("title", false),
        _ => None,
    }
}
