//! DEF reader.
//!
//! Populates an existing [`Block`] with the design header, components, pins,
//! and nets of a DEF file. Sections the database does not model (vias, rows,
//! tracks, routing geometry, ...) are skipped structurally. Entries are
//! pushed into the block as they parse, so a mid-file error leaves the block
//! partially populated rather than empty.

use std::path::Path;

use arcstr::ArcStr;
use thiserror::Error;

use crate::db::{Block, Inst, Net, NetConn, Orient, Pin, PinDirection, PlaceStatus, Point, Rect};
use crate::lex::{Token, TokenStream};

#[derive(Debug, Error)]
pub enum DefError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("line {line}: expected {expected}, found `{found}`")]
    Unexpected {
        line: usize,
        expected: &'static str,
        found: String,
    },

    #[error("line {line}: invalid number `{value}`")]
    InvalidNumber { line: usize, value: String },

    #[error("line {line}: {msg}")]
    Malformed { line: usize, msg: &'static str },

    #[error("unexpected end of file (missing END DESIGN)")]
    Eof,
}

pub fn read_def(path: &Path, block: &mut Block) -> Result<(), DefError> {
    let src = std::fs::read_to_string(path)?;
    parse_str(&src, block)
}

pub fn parse_str(src: &str, block: &mut Block) -> Result<(), DefError> {
    Parser {
        ts: TokenStream::new(src),
    }
    .parse(block)
}

struct Parser {
    ts: TokenStream,
}

impl Parser {
    fn parse(&mut self, block: &mut Block) -> Result<(), DefError> {
        while let Some(tok) = self.ts.bump() {
            let kw = tok.text.to_ascii_uppercase();
            match kw.as_str() {
                "DESIGN" => {
                    let name = self.ident()?;
                    block.design_name = Some(ArcStr::from(name.text));
                    self.expect(";")?;
                }
                "UNITS" => {
                    self.expect("DISTANCE")?;
                    self.expect("MICRONS")?;
                    let (dbu, line) = self.int()?;
                    if dbu <= 0 {
                        return Err(DefError::Malformed {
                            line,
                            msg: "UNITS DISTANCE MICRONS must be positive",
                        });
                    }
                    block.dbu_per_micron = dbu as u32;
                    self.expect(";")?;
                }
                "DIEAREA" => {
                    block.die_area = Some(self.die_area()?);
                }
                "COMPONENTS" => self.components(block)?,
                "PINS" => self.pins(block)?,
                "NETS" => self.nets(block, false)?,
                "SPECIALNETS" => self.nets(block, true)?,
                "PROPERTYDEFINITIONS" | "VIAS" | "NONDEFAULTRULES" | "REGIONS" | "GROUPS"
                | "BLOCKAGES" | "FILLS" | "SCANCHAINS" | "STYLES" => self.skip_section(&kw)?,
                "END" => {
                    let tok = self.bump()?;
                    if tok.text.eq_ignore_ascii_case("DESIGN") {
                        return Ok(());
                    }
                }
                // VERSION, DIVIDERCHAR, BUSBITCHARS, TECHNOLOGY, HISTORY,
                // ROW, TRACKS, GCELLGRID, and anything else statement-shaped.
                _ => self.skip_statement()?,
            }
        }
        Err(DefError::Eof)
    }

    /// `DIEAREA ( x y ) ( x y ) [( x y ) ...] ;` — reduced to the bounding
    /// box over all points.
    fn die_area(&mut self) -> Result<Rect, DefError> {
        let mut lo = Point {
            x: i64::MAX,
            y: i64::MAX,
        };
        let mut hi = Point {
            x: i64::MIN,
            y: i64::MIN,
        };
        let mut points = 0;
        loop {
            let tok = self.bump()?;
            match tok.text.as_str() {
                "(" => {
                    let (x, _) = self.int()?;
                    let (y, _) = self.int()?;
                    self.expect(")")?;
                    lo.x = lo.x.min(x);
                    lo.y = lo.y.min(y);
                    hi.x = hi.x.max(x);
                    hi.y = hi.y.max(y);
                    points += 1;
                }
                ";" => {
                    if points < 2 {
                        return Err(DefError::Malformed {
                            line: tok.line,
                            msg: "DIEAREA needs at least two points",
                        });
                    }
                    return Ok(Rect { lo, hi });
                }
                _ => {
                    return Err(DefError::Unexpected {
                        line: tok.line,
                        expected: "`(` or `;`",
                        found: tok.text,
                    })
                }
            }
        }
    }

    fn components(&mut self, block: &mut Block) -> Result<(), DefError> {
        let declared = self.section_header(";")?;
        let mut seen = 0usize;
        loop {
            let tok = self.bump()?;
            if tok.text == "-" {
                let name = self.ident()?;
                let master = self.ident()?;
                let mut inst = Inst {
                    name: ArcStr::from(name.text),
                    master: ArcStr::from(master.text),
                    status: PlaceStatus::Unplaced,
                    loc: None,
                    orient: None,
                };
                loop {
                    let tok = self.bump()?;
                    match tok.text.as_str() {
                        ";" => break,
                        "+" => {
                            let opt = self.bump()?;
                            match opt.text.to_ascii_uppercase().as_str() {
                                "PLACED" | "FIXED" | "COVER" => {
                                    inst.status = match opt.text.to_ascii_uppercase().as_str() {
                                        "FIXED" => PlaceStatus::Fixed,
                                        "COVER" => PlaceStatus::Cover,
                                        _ => PlaceStatus::Placed,
                                    };
                                    let (loc, orient) = self.placement()?;
                                    inst.loc = Some(loc);
                                    inst.orient = Some(orient);
                                }
                                "UNPLACED" => inst.status = PlaceStatus::Unplaced,
                                // SOURCE, WEIGHT, REGION, HALO, PROPERTY, ...
                                _ => self.skip_option()?,
                            }
                        }
                        _ => {
                            return Err(DefError::Unexpected {
                                line: tok.line,
                                expected: "`+` or `;`",
                                found: tok.text,
                            })
                        }
                    }
                }
                block.insts.push(inst);
                seen += 1;
            } else if tok.text.eq_ignore_ascii_case("END") {
                self.expect("COMPONENTS")?;
                break;
            } else {
                return Err(DefError::Unexpected {
                    line: tok.line,
                    expected: "`-` or `END COMPONENTS`",
                    found: tok.text,
                });
            }
        }
        check_count("components", declared, seen);
        Ok(())
    }

    fn pins(&mut self, block: &mut Block) -> Result<(), DefError> {
        let declared = self.section_header(";")?;
        let mut seen = 0usize;
        loop {
            let tok = self.bump()?;
            if tok.text == "-" {
                let name = self.ident()?;
                let mut pin = Pin {
                    name: ArcStr::from(name.text),
                    net: None,
                    direction: None,
                };
                loop {
                    let tok = self.bump()?;
                    match tok.text.as_str() {
                        ";" => break,
                        "+" => {
                            let opt = self.bump()?;
                            match opt.text.to_ascii_uppercase().as_str() {
                                "NET" => {
                                    let net = self.ident()?;
                                    pin.net = Some(ArcStr::from(net.text));
                                }
                                "DIRECTION" => {
                                    let dir = self.ident()?;
                                    pin.direction = PinDirection::parse(&dir.text);
                                }
                                // USE, SPECIAL, LAYER, PLACED, FIXED, PORT, ...
                                _ => self.skip_option()?,
                            }
                        }
                        _ => {
                            return Err(DefError::Unexpected {
                                line: tok.line,
                                expected: "`+` or `;`",
                                found: tok.text,
                            })
                        }
                    }
                }
                block.pins.push(pin);
                seen += 1;
            } else if tok.text.eq_ignore_ascii_case("END") {
                self.expect("PINS")?;
                break;
            } else {
                return Err(DefError::Unexpected {
                    line: tok.line,
                    expected: "`-` or `END PINS`",
                    found: tok.text,
                });
            }
        }
        check_count("pins", declared, seen);
        Ok(())
    }

    fn nets(&mut self, block: &mut Block, special: bool) -> Result<(), DefError> {
        let section: &'static str = if special { "SPECIALNETS" } else { "NETS" };
        let declared = self.section_header(";")?;
        let mut seen = 0usize;
        loop {
            let tok = self.bump()?;
            if tok.text == "-" {
                let name = self.ident()?;
                let mut net = Net {
                    name: ArcStr::from(name.text),
                    special,
                    conns: Vec::new(),
                };
                loop {
                    let tok = self.bump()?;
                    match tok.text.as_str() {
                        ";" => break,
                        "(" => {
                            let comp = self.ident()?;
                            let pin = self.ident()?;
                            self.expect(")")?;
                            let inst = if comp.text == "PIN" {
                                None
                            } else {
                                Some(ArcStr::from(comp.text))
                            };
                            net.conns.push(NetConn {
                                inst,
                                pin: ArcStr::from(pin.text),
                            });
                        }
                        // USE, ROUTED, SHIELDNET, NONDEFAULTRULE, SHAPE, ...
                        // Routing geometry carries no `+` or `;` of its own,
                        // so it is consumed wholesale.
                        "+" => {
                            self.bump()?;
                            self.skip_option()?;
                        }
                        _ => {
                            return Err(DefError::Unexpected {
                                line: tok.line,
                                expected: "`(`, `+`, or `;`",
                                found: tok.text,
                            })
                        }
                    }
                }
                block.nets.push(net);
                seen += 1;
            } else if tok.text.eq_ignore_ascii_case("END") {
                let end = self.bump()?;
                if !end.text.eq_ignore_ascii_case(section) {
                    return Err(DefError::Unexpected {
                        line: end.line,
                        expected: "section name after END",
                        found: end.text,
                    });
                }
                break;
            } else {
                return Err(DefError::Unexpected {
                    line: tok.line,
                    expected: "`-` or `END`",
                    found: tok.text,
                });
            }
        }
        check_count(if special { "special nets" } else { "nets" }, declared, seen);
        Ok(())
    }

    /// Reads the `<count> ;` header of a counted section.
    fn section_header(&mut self, term: &'static str) -> Result<i64, DefError> {
        let (declared, _) = self.int()?;
        self.expect(term)?;
        Ok(declared)
    }

    /// `( x y ) <orient>` after PLACED/FIXED/COVER.
    fn placement(&mut self) -> Result<(Point, Orient), DefError> {
        self.expect("(")?;
        let (x, _) = self.int()?;
        let (y, _) = self.int()?;
        self.expect(")")?;
        let tok = self.bump()?;
        let orient = Orient::parse(&tok.text).ok_or(DefError::Unexpected {
            line: tok.line,
            expected: "orientation",
            found: tok.text,
        })?;
        Ok((Point { x, y }, orient))
    }

    /// Consumes tokens up to (but not including) the next `+` or `;`.
    fn skip_option(&mut self) -> Result<(), DefError> {
        loop {
            let stop = match self.ts.peek() {
                None => return Err(DefError::Eof),
                Some(t) => t.text == "+" || t.text == ";",
            };
            if stop {
                return Ok(());
            }
            self.ts.bump();
        }
    }

    /// Consumes tokens through the next `;`.
    fn skip_statement(&mut self) -> Result<(), DefError> {
        loop {
            let tok = self.bump()?;
            if tok.text == ";" {
                return Ok(());
            }
        }
    }

    /// Consumes a section through `END <kw>`.
    fn skip_section(&mut self, kw: &str) -> Result<(), DefError> {
        loop {
            let tok = self.bump()?;
            if tok.text.eq_ignore_ascii_case("END") {
                let matches = self
                    .ts
                    .peek()
                    .is_some_and(|t| t.text.eq_ignore_ascii_case(kw));
                if matches {
                    self.ts.bump();
                    return Ok(());
                }
            }
        }
    }

    fn bump(&mut self) -> Result<Token, DefError> {
        self.ts.bump().ok_or(DefError::Eof)
    }

    fn expect(&mut self, want: &'static str) -> Result<Token, DefError> {
        let tok = self.bump()?;
        if tok.text.eq_ignore_ascii_case(want) {
            Ok(tok)
        } else {
            Err(DefError::Unexpected {
                line: tok.line,
                expected: want,
                found: tok.text,
            })
        }
    }

    fn ident(&mut self) -> Result<Token, DefError> {
        let tok = self.bump()?;
        match tok.text.as_str() {
            "(" | ")" | ";" | "+" | "-" => Err(DefError::Unexpected {
                line: tok.line,
                expected: "identifier",
                found: tok.text,
            }),
            _ => Ok(tok),
        }
    }

    fn int(&mut self) -> Result<(i64, usize), DefError> {
        let tok = self.bump()?;
        match tok.text.parse() {
            Ok(v) => Ok((v, tok.line)),
            Err(_) => Err(DefError::InvalidNumber {
                line: tok.line,
                value: tok.text,
            }),
        }
    }
}

fn check_count(what: &str, declared: i64, seen: usize) {
    if declared >= 0 && seen != declared as usize {
        log::warn!("DEF declares {declared} {what}, found {seen}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DESIGN_DEF: &str = r#"VERSION 5.8 ;
DIVIDERCHAR "/" ;
BUSBITCHARS "[]" ;
DESIGN spm ;
UNITS DISTANCE MICRONS 1000 ;
DIEAREA ( 0 0 ) ( 100000 100000 ) ;
COMPONENTS 3 ;
- u1 INVX1 + PLACED ( 1000 2000 ) N ;
- u2 INVX1 + PLACED ( 3000 2000 ) FS ;
- u3 DFFX1 + UNPLACED ;
END COMPONENTS
PINS 2 ;
- clk + NET clk + DIRECTION INPUT + USE SIGNAL ;
- dout + NET n4 + DIRECTION OUTPUT ;
END PINS
NETS 5 ;
- clk ( PIN clk ) ( u3 CLK ) + USE CLOCK ;
- n1 ( u1 A ) ( u3 Q ) ;
- n2 ( u1 Y ) ( u2 A ) ;
- n3 ( u2 Y ) ( u3 D ) ;
- n4 ( PIN dout ) ( u3 Q ) ;
END NETS
END DESIGN
"#;

    fn parse(src: &str) -> Block {
        let mut block = Block::new("top");
        parse_str(src, &mut block).unwrap();
        block
    }

    #[test]
    fn reads_header() {
        let block = parse(DESIGN_DEF);
        assert_eq!(block.name(), "top");
        assert_eq!(block.design_name.as_deref(), Some("spm"));
        assert_eq!(block.dbu_per_micron, 1000);
        let die = block.die_area.unwrap();
        assert_eq!(die.width(), 100000);
        assert_eq!(die.height(), 100000);
    }

    #[test]
    fn reads_components() {
        let block = parse(DESIGN_DEF);
        assert_eq!(block.insts.len(), 3);

        let u1 = &block.insts[0];
        assert_eq!(u1.name.as_str(), "u1");
        assert_eq!(u1.master.as_str(), "INVX1");
        assert_eq!(u1.status, PlaceStatus::Placed);
        assert_eq!(u1.loc, Some(Point { x: 1000, y: 2000 }));
        assert_eq!(u1.orient, Some(Orient::N));

        assert_eq!(block.insts[1].orient, Some(Orient::Fs));

        let u3 = &block.insts[2];
        assert_eq!(u3.status, PlaceStatus::Unplaced);
        assert_eq!(u3.loc, None);
    }

    #[test]
    fn reads_pins_and_nets() {
        let block = parse(DESIGN_DEF);
        assert_eq!(block.pins.len(), 2);
        assert_eq!(block.nets.len(), 5);

        let clk_pin = &block.pins[0];
        assert_eq!(clk_pin.net.as_deref(), Some("clk"));
        assert_eq!(clk_pin.direction, Some(PinDirection::Input));

        let clk = &block.nets[0];
        assert!(!clk.special);
        assert_eq!(clk.conns.len(), 2);
        assert_eq!(clk.conns[0].inst, None);
        assert_eq!(clk.conns[0].pin.as_str(), "clk");
        assert_eq!(clk.conns[1].inst.as_deref(), Some("u3"));
        assert_eq!(clk.conns[1].pin.as_str(), "CLK");
    }

    #[test]
    fn special_nets_count_as_nets() {
        let src = "\
DESIGN pg ;
SPECIALNETS 2 ;
- vdd ( u1 VPWR ) ( u2 VPWR ) + USE POWER
  + ROUTED met1 1600 + SHAPE STRIPE ( 0 0 ) ( 0 50000 ) ;
- vss ( u1 VGND ) + USE GROUND ;
END SPECIALNETS
END DESIGN
";
        let block = parse(src);
        assert_eq!(block.nets.len(), 2);
        assert!(block.nets.iter().all(|n| n.special));
        assert_eq!(block.nets[0].conns.len(), 2);
    }

    #[test]
    fn skips_unmodeled_sections_and_statements() {
        let src = "\
VERSION 5.8 ;
DESIGN routed ;
ROW ROW_0 unithd 0 0 N DO 100 BY 1 STEP 460 0 ;
TRACKS X 230 DO 100 STEP 460 LAYER met1 ;
GCELLGRID X 0 DO 10 STEP 6900 ;
VIAS 1 ;
- via1_0 + RECT met1 ( -60 -60 ) ( 60 60 ) ;
END VIAS
COMPONENTS 1 ;
- u1 INVX1 + PLACED ( 0 0 ) N + SOURCE DIST + WEIGHT 5 ;
END COMPONENTS
END DESIGN
";
        let block = parse(src);
        assert_eq!(block.insts.len(), 1);
        assert_eq!(block.insts[0].status, PlaceStatus::Placed);
    }

    #[test]
    fn tolerates_declared_count_mismatch() {
        let src = "\
DESIGN miscounted ;
COMPONENTS 4 ;
- u1 INVX1 ;
END COMPONENTS
END DESIGN
";
        let block = parse(src);
        assert_eq!(block.insts.len(), 1);
    }

    #[test]
    fn negative_die_area_coordinates() {
        let src = "DESIGN d ;\nDIEAREA ( -70 -70 ) ( 70 70 ) ;\nEND DESIGN\n";
        let block = parse(src);
        let die = block.die_area.unwrap();
        assert_eq!(die.lo, Point { x: -70, y: -70 });
        assert_eq!(die.width(), 140);
    }

    #[test]
    fn error_carries_line_number() {
        let src = "DESIGN d ;\nDIEAREA ( zero 0 ) ( 70 70 ) ;\nEND DESIGN\n";
        let mut block = Block::new("top");
        let err = parse_str(src, &mut block).unwrap_err();
        assert!(matches!(
            err,
            DefError::InvalidNumber { line: 2, ref value } if value == "zero"
        ));
    }

    #[test]
    fn missing_end_design_is_an_error() {
        let src = "\
DESIGN truncated ;
COMPONENTS 2 ;
- u1 INVX1 ;
- u2 INVX1 ;
END COMPONENTS
";
        let mut block = Block::new("top");
        let err = parse_str(src, &mut block).unwrap_err();
        assert!(matches!(err, DefError::Eof));
        // Entries read before the error stay in the block.
        assert_eq!(block.insts.len(), 2);
    }

    #[test]
    fn empty_input_is_an_error() {
        let mut block = Block::new("top");
        assert!(matches!(parse_str("", &mut block), Err(DefError::Eof)));
        assert!(block.insts.is_empty());
        assert!(block.nets.is_empty());
    }
}
