/// Classification of a significant byte in an expression.
///
/// The parser only ever needs to know which construct the next byte opens,
/// so the scanner maps every byte to one of these signals.
///
/// # Examples
/// ```
/// use graphquery::ast::Signal;
///
/// assert_eq!(Signal::of(b'a'), Signal::Name);
/// assert_eq!(Signal::of(b'['), Signal::Array);
/// assert_eq!(Signal::of(b'"'), Signal::Invalid);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// Not the start of any construct
    Invalid,

    /// Start of a node name or operation name
    ///
    /// # Examples
    /// ```text
    /// title
    /// __json__
    /// item2
    /// ```
    Name,

    /// Start of a pipeline block
    ///
    /// # Examples
    /// ```text
    /// `css(".title"); text()`
    /// ```
    Pipeline,

    /// Start of an object block
    ///
    /// # Examples
    /// ```text
    /// { title `css("h1")` }
    /// ```
    Object,

    /// Start of an array or object-array block
    ///
    /// # Examples
    /// ```text
    /// [ tag `text()` ]
    /// [{ title `text()` }]
    /// ```
    Array,
}

impl Signal {
    /// Classifies a single byte.
    pub fn of(byte: u8) -> Self {
        match byte {
            b if b.is_ascii_alphanumeric() || b == b'_' => Signal::Name,
            b'[' => Signal::Array,
            b'{' => Signal::Object,
            b'`' => Signal::Pipeline,
            _ => Signal::Invalid,
        }
    }

    /// Classifies an optional byte, treating end of input as invalid.
    pub fn of_opt(byte: Option<u8>) -> Self {
        byte.map_or(Signal::Invalid, Signal::of)
    }
}
