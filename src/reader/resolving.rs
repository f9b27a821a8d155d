//! Executes a resolution program against writer-encoded bytes.

use crate::error::DecodeError;
use crate::grammar::{Action, EnumAdjust, Program, ReorderedField, Symbol, SymbolId, Terminal};
use crate::reader::decode::{
    decode_block_count, decode_boolean, decode_bytes, decode_double, decode_fixed, decode_float,
    decode_int, decode_long, decode_string, decode_union_index, AvroValue,
};
use crate::schema::apply_promotion;

/// Upper bound on array items that occupy no bytes in the stream, such as
/// `null` or empty records. A block count alone cannot make the decoder
/// materialise more than this.
pub const MAX_ZERO_WIDTH_ITEMS: usize = 1 << 20;

/// Decodes writer data into reader-shaped values by walking a compiled
/// [`Program`].
///
/// The decoder only borrows the program and keeps no state between calls,
/// so one program can serve any number of decoders on any number of
/// threads.
///
/// # Example
/// ```
/// use avro_grammar::grammar::compile;
/// use avro_grammar::reader::{AvroValue, ResolvingDecoder};
/// use avro_grammar::schema::AvroSchema;
///
/// let program = compile(&AvroSchema::Int, &AvroSchema::Long).unwrap();
/// let decoder = ResolvingDecoder::new(&program);
/// let mut data: &[u8] = &[0x0A];
/// assert_eq!(decoder.decode(&mut data).unwrap(), AvroValue::Long(5));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ResolvingDecoder<'p> {
    program: &'p Program,
}

impl<'p> ResolvingDecoder<'p> {
    pub fn new(program: &'p Program) -> Self {
        Self { program }
    }

    pub fn program(&self) -> &'p Program {
        self.program
    }

    /// Decode one value, advancing `data` past the writer's encoding.
    pub fn decode(&self, data: &mut &[u8]) -> Result<AvroValue, DecodeError> {
        self.run(self.program.root(), data)
    }

    fn symbol(&self, id: SymbolId) -> Result<&'p Symbol, DecodeError> {
        self.program
            .get(id)
            .ok_or_else(|| DecodeError::InvalidData(format!("Dangling symbol {}", id)))
    }

    fn run(&self, id: SymbolId, data: &mut &[u8]) -> Result<AvroValue, DecodeError> {
        match self.symbol(id)? {
            Symbol::Terminal(terminal) => read_terminal(*terminal, data),
            Symbol::Sequence(children) => self.run_sequence(children, data),
            Symbol::Alternative(branches) => {
                let index = decode_union_index(data, branches.len())?;
                self.run(branches[index].symbol, data)
            }
            Symbol::Action(action) => self.run_action(action, data),
            Symbol::Repeat { .. } => Err(unexpected("repeat", id)),
        }
    }

    fn run_action(&self, action: &Action, data: &mut &[u8]) -> Result<AvroValue, DecodeError> {
        match action {
            Action::NumericPromote { symbol, promotion } => {
                apply_promotion(self.run(*symbol, data)?, *promotion)
            }
            // The alternative reads the writer's branch index; the branch
            // already produces the reader's shape.
            Action::UnionBranchSelect(alternative) => self.run(*alternative, data),
            Action::UnionAdjust { index, symbol } => {
                let value = self.run(*symbol, data)?;
                Ok(AvroValue::Union(*index as i32, Box::new(value)))
            }
            Action::Error(message) => Err(DecodeError::Incompatible(message.clone())),
            other => Err(DecodeError::InvalidData(format!(
                "Action {:?} outside of its enclosing sequence",
                other
            ))),
        }
    }

    fn run_sequence(&self, children: &[SymbolId], data: &mut &[u8]) -> Result<AvroValue, DecodeError> {
        let head = match children.first() {
            Some(id) => self.symbol(*id)?,
            None => return Err(DecodeError::InvalidData("Empty sequence".into())),
        };
        let second = match children.get(1) {
            Some(id) => Some(self.symbol(*id)?),
            None => None,
        };

        match (head, second) {
            (Symbol::Terminal(Terminal::ArrayStart), Some(Symbol::Repeat { body, .. })) => {
                self.read_array(body, data)
            }
            (Symbol::Terminal(Terminal::MapStart), Some(Symbol::Repeat { body, .. })) => {
                self.read_map(body, data)
            }
            (Symbol::Terminal(Terminal::Enum), Some(Symbol::Action(Action::EnumRemap(adjust)))) => {
                read_enum(adjust, data)
            }
            (Symbol::Terminal(Terminal::Union), Some(Symbol::Alternative(branches))) => {
                let index = decode_union_index(data, branches.len())?;
                let value = self.run(branches[index].symbol, data)?;
                Ok(AvroValue::Union(index as i32, Box::new(value)))
            }
            _ => self.read_record(children, data),
        }
    }

    fn read_array(&self, body: &[SymbolId], data: &mut &[u8]) -> Result<AvroValue, DecodeError> {
        let [item] = body else {
            return Err(DecodeError::InvalidData("Malformed array body".into()));
        };
        let mut items = Vec::new();
        let mut zero_width = 0usize;
        loop {
            let count = decode_block_count(data)?;
            if count == 0 {
                break;
            }
            items.reserve(count.min(data.len()));
            for _ in 0..count {
                let before = data.len();
                items.push(self.run(*item, data)?);
                if data.len() == before {
                    zero_width += 1;
                    if zero_width > MAX_ZERO_WIDTH_ITEMS {
                        return Err(DecodeError::InvalidData(format!(
                            "Array has more than {} zero-width items",
                            MAX_ZERO_WIDTH_ITEMS
                        )));
                    }
                }
            }
        }
        Ok(AvroValue::Array(items))
    }

    fn read_map(&self, body: &[SymbolId], data: &mut &[u8]) -> Result<AvroValue, DecodeError> {
        let [_key, value] = body else {
            return Err(DecodeError::InvalidData("Malformed map body".into()));
        };
        let mut entries = Vec::new();
        loop {
            let count = decode_block_count(data)?;
            if count == 0 {
                break;
            }
            for _ in 0..count {
                let key = decode_string(data)?;
                entries.push((key, self.run(*value, data)?));
            }
        }
        Ok(AvroValue::Map(entries))
    }

    /// Field values are collected in arrival order and placed by the
    /// closing `FieldReorder`.
    fn read_record(&self, children: &[SymbolId], data: &mut &[u8]) -> Result<AvroValue, DecodeError> {
        let mut values = Vec::with_capacity(children.len());
        let mut i = 0;
        while i < children.len() {
            let id = children[i];
            match self.symbol(id)? {
                Symbol::Action(Action::Skip(skipped)) => {
                    self.run(*skipped, data)?;
                }
                Symbol::Action(Action::DefaultInject { bytes, .. }) => {
                    let (Some(default), Some(end)) = (children.get(i + 1), children.get(i + 2))
                    else {
                        return Err(unexpected("default", id));
                    };
                    if !matches!(self.symbol(*end)?, Symbol::Action(Action::DefaultEnd)) {
                        return Err(unexpected("default", id));
                    }
                    let mut replay: &[u8] = bytes;
                    values.push(self.run(*default, &mut replay)?);
                    if !replay.is_empty() {
                        return Err(DecodeError::InvalidData(format!(
                            "{} bytes left over after default at symbol {}",
                            replay.len(),
                            id
                        )));
                    }
                    i += 2;
                }
                Symbol::Action(Action::FieldReorder(order)) => {
                    return place_fields(order, values);
                }
                _ => values.push(self.run(id, data)?),
            }
            i += 1;
        }
        Err(DecodeError::InvalidData(
            "Record sequence without field order".into(),
        ))
    }
}

fn unexpected(what: &str, id: SymbolId) -> DecodeError {
    DecodeError::InvalidData(format!("Unexpected {} at symbol {}", what, id))
}

fn read_terminal(terminal: Terminal, data: &mut &[u8]) -> Result<AvroValue, DecodeError> {
    Ok(match terminal {
        Terminal::Null => AvroValue::Null,
        Terminal::Boolean => AvroValue::Boolean(decode_boolean(data)?),
        Terminal::Int => AvroValue::Int(decode_int(data)?),
        Terminal::Long => AvroValue::Long(decode_long(data)?),
        Terminal::Float => AvroValue::Float(decode_float(data)?),
        Terminal::Double => AvroValue::Double(decode_double(data)?),
        Terminal::String => AvroValue::String(decode_string(data)?),
        Terminal::Bytes => AvroValue::Bytes(decode_bytes(data)?),
        Terminal::Fixed(size) => AvroValue::Fixed(decode_fixed(data, size)?),
        other => {
            return Err(DecodeError::InvalidData(format!(
                "Terminal {:?} outside of its enclosing sequence",
                other
            )))
        }
    })
}

fn read_enum(adjust: &EnumAdjust, data: &mut &[u8]) -> Result<AvroValue, DecodeError> {
    let ordinal = decode_int(data)?;
    let writer_ordinal = usize::try_from(ordinal)
        .map_err(|_| DecodeError::InvalidData(format!("Negative enum ordinal: {}", ordinal)))?;
    let reader_ordinal = adjust
        .resolve(writer_ordinal)
        .ok_or(DecodeError::UnmappableEnumSymbol {
            ordinal: writer_ordinal,
        })?;
    let symbol = adjust
        .reader_symbols
        .get(reader_ordinal)
        .cloned()
        .ok_or(DecodeError::UnmappableEnumSymbol {
            ordinal: writer_ordinal,
        })?;
    Ok(AvroValue::Enum(reader_ordinal as i32, symbol))
}

fn place_fields(order: &[ReorderedField], values: Vec<AvroValue>) -> Result<AvroValue, DecodeError> {
    if order.len() != values.len() {
        return Err(DecodeError::InvalidData(format!(
            "Record expects {} fields, decoded {}",
            order.len(),
            values.len()
        )));
    }
    let mut slots: Vec<Option<(String, AvroValue)>> = vec![None; order.len()];
    for (field, value) in order.iter().zip(values) {
        let slot = slots.get_mut(field.reader_index).ok_or_else(|| {
            DecodeError::InvalidData(format!(
                "Field {} has reader index {} out of range",
                field.name, field.reader_index
            ))
        })?;
        *slot = Some((field.name.clone(), value));
    }
    let fields = slots
        .into_iter()
        .map(|slot| slot.ok_or_else(|| DecodeError::InvalidData("Unfilled record field".into())))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(AvroValue::Record(fields))
}
