use std::io::{ BufRead, BufReader, Read };
use std::path::Path;
use std::fs::File;
use std::collections::BTreeMap;

use log::{ debug, trace };

use crate::error::{ Error, Result };
use crate::tuple::Tuple4D;
use crate::shape::Shape;
use crate::geometry::{ SmoothTriangleInfo, TriangleInfo };

/// One corner of a face: a vertex index and, optionally, a normal index.
/// Both are already resolved to zero-based positions.
type FaceVertex = (usize, Option<usize>);

/// The shapes and raw records read from an OBJ file.
#[derive(Clone, Debug)]
pub struct ObjModel {
    pub vertices: Vec<Tuple4D>,
    pub normals: Vec<Tuple4D>,

    /// Faces that appear before any `g` statement.
    pub default_group: Shape,

    pub groups: BTreeMap<String, Shape>,

    /// Lines with statements this parser does not understand.
    pub ignored_lines: usize,
}

impl ObjModel {
    /// Merges the default group and every named group into a single group.
    /// Empty groups are left out.
    pub fn into_group(self) -> Shape {
        let mut model = Shape::group();

        let named = self.groups.into_iter().map(|(_, g)| g);
        for group in std::iter::once(self.default_group).chain(named) {
            if group.children().map_or(false, |c| !c.is_empty()) {
                model.add_child(group);
            }
        }

        model
    }
}

/// A parser for Wavefront OBJ files.
///
/// Understands `v`, `vn`, `f` and `g`; any other statement is counted in
/// `ignored_lines` and skipped. A sample file looks like this:
///
/// ```obj
/// v -1 1 0
/// v -1 0 0
/// v 1 0 0
/// v 1 1 0
///
/// g FirstGroup
/// f 1 2 3
/// g SecondGroup
/// f 1 3 4
/// ```
///
/// Groups do not nest: `SecondGroup` above is a sibling of `FirstGroup`.
pub struct ObjParser {
    line: usize,
    ignored_lines: usize,

    vertices: Vec<Tuple4D>,
    normals: Vec<Tuple4D>,

    default_group: Shape,
    groups: BTreeMap<String, Shape>,

    /// `None` while faces go to the default group.
    current_group: Option<String>,
}

impl ObjParser {
    fn new() -> ObjParser {
        ObjParser {
            line: 0,
            ignored_lines: 0,
            vertices: Vec::new(),
            normals: Vec::new(),
            default_group: Shape::group(),
            groups: BTreeMap::new(),
            current_group: None,
        }
    }

    /// Reads a whole OBJ document from `reader`.
    ///
    /// Malformed vertex, normal or face data aborts the parse with
    /// [`Error::Obj`]. Zero-area triangles are dropped.
    pub fn parse<R: Read>(reader: R) -> Result<ObjModel> {
        let mut parser = ObjParser::new();

        for line in BufReader::new(reader).lines() {
            parser.line += 1;
            parser.statement(line?.trim())?;
        }

        debug!("parsed OBJ: {} vertices, {} normals, {} named groups, {} lines ignored",
            parser.vertices.len(), parser.normals.len(), parser.groups.len(),
            parser.ignored_lines);

        Ok(ObjModel {
            vertices: parser.vertices,
            normals: parser.normals,
            default_group: parser.default_group,
            groups: parser.groups,
            ignored_lines: parser.ignored_lines,
        })
    }

    /// Opens and parses the OBJ file at `path`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<ObjModel> {
        ObjParser::parse(File::open(path)?)
    }

    fn error<T>(&self, message: String) -> Result<T> {
        Err(Error::Obj { line: self.line, message })
    }

    fn statement(&mut self, line: &str) -> Result<()> {
        if line.is_empty() {
            return Ok(());
        }

        let mut params = line.split_whitespace();
        let command = params.next().unwrap_or_default();
        let params: Vec<&str> = params.collect();

        match command {
            "v" => {
                let (x, y, z) = self.triple(&params, "vertex")?;
                self.vertices.push(Tuple4D::point(x, y, z));
            },

            "vn" => {
                let (x, y, z) = self.triple(&params, "normal")?;
                self.normals.push(Tuple4D::vector(x, y, z));
            },

            "f" => self.face(&params)?,

            "g" => {
                self.current_group = params.first().map(|name| {
                    self.groups.entry(name.to_string()).or_insert_with(Shape::group);
                    name.to_string()
                });
            },

            _ => {
                trace!("ignoring OBJ line {}: {:?}", self.line, line);
                self.ignored_lines += 1;
            },
        }

        Ok(())
    }

    /// The first three numbers of a `v` or `vn` statement. A fourth
    /// (homogeneous) coordinate is accepted and dropped.
    fn triple(&self, params: &[&str], what: &str) -> Result<(f64, f64, f64)> {
        if params.len() < 3 {
            return self.error(format!("{} needs three coordinates", what));
        }

        let mut xyz = [0.0; 3];
        for (slot, text) in xyz.iter_mut().zip(params.iter()) {
            *slot = match text.parse() {
                Ok(value) => value,
                Err(_) => return self.error(format!("bad {} coordinate {:?}", what, text)),
            };
        }

        Ok((xyz[0], xyz[1], xyz[2]))
    }

    /// Resolves a one-based (or negative, counted from the end) OBJ index
    /// into a list of `len` entries.
    fn index(&self, text: &str, len: usize, what: &str) -> Result<usize> {
        let raw: i64 = match text.parse() {
            Ok(raw) => raw,
            Err(_) => return self.error(format!("bad {} index {:?}", what, text)),
        };

        let resolved = if raw > 0 {
            Some(raw as usize - 1)
        } else if raw < 0 {
            len.checked_sub(raw.unsigned_abs() as usize)
        } else {
            None
        };

        match resolved {
            Some(i) if i < len => Ok(i),
            _ => self.error(format!("{} index {} out of range ({} defined)", what, raw, len)),
        }
    }

    /// Parses `v`, `v/vt`, `v//vn` or `v/vt/vn`. Texture indices are skipped.
    fn face_vertex(&self, text: &str) -> Result<FaceVertex> {
        let attributes: Vec<&str> = text.split('/').collect();
        if attributes.len() > 3 {
            return self.error(format!("bad face vertex {:?}", text));
        }

        let vertex = self.index(attributes[0], self.vertices.len(), "vertex")?;
        let normal = match attributes.get(2) {
            Some(n) if !n.is_empty() => Some(self.index(n, self.normals.len(), "normal")?),
            _ => None,
        };

        Ok((vertex, normal))
    }

    fn face(&mut self, params: &[&str]) -> Result<()> {
        if params.len() < 3 {
            return self.error(format!("face needs three vertices, got {}", params.len()));
        }

        let face = params.iter()
            .map(|p| self.face_vertex(p))
            .collect::<Result<Vec<FaceVertex>>>()?;

        let triangles = self.fan_triangulation(&face);
        let group = match self.current_group {
            Some(ref name) => self.groups.entry(name.clone()).or_insert_with(Shape::group),
            None => &mut self.default_group,
        };

        for triangle in triangles {
            group.add_child(triangle);
        }

        Ok(())
    }

    /// Splits a convex polygon into triangles that all share its first
    /// vertex. For a pentagon `A B C D E` that is `A-B-C`, `A-C-D` and
    /// `A-D-E`.
    ///
    /// A triangle is smooth when all three of its corners carry a normal.
    /// Zero-area triangles are skipped.
    fn fan_triangulation(&self, face: &[FaceVertex]) -> Vec<Shape> {
        let mut triangles = Vec::with_capacity(face.len() - 2);

        for i in 1..(face.len() - 1) {
            let (a, b, c) = (face[0], face[i], face[i + 1]);
            let info = match TriangleInfo::try_new(
                self.vertices[a.0], self.vertices[b.0], self.vertices[c.0]
            ) {
                Some(info) => info,
                None => {
                    trace!("skipping degenerate triangle on OBJ line {}", self.line);
                    continue;
                },
            };

            let shape = match (a.1, b.1, c.1) {
                (Some(n1), Some(n2), Some(n3)) => Shape::from_smooth_triangle(
                    SmoothTriangleInfo {
                        triangle: info,
                        n1: self.normals[n1],
                        n2: self.normals[n2],
                        n3: self.normals[n3],
                    }
                ),
                _ => Shape::from_triangle(info),
            };

            triangles.push(shape);
        }

        triangles
    }
}

#[cfg(test)]
use crate::shape::ShapeType;

#[cfg(test)]
fn parse(text: &str) -> ObjModel {
    ObjParser::parse(text.as_bytes()).unwrap()
}

#[cfg(test)]
fn triangle_at(group: &Shape, i: usize) -> TriangleInfo {
    match group.children().unwrap()[i].ty() {
        ShapeType::Triangle(info) => *info,
        ShapeType::SmoothTriangle(info) => info.triangle,
        other => panic!("expected a triangle, found {:?}", other),
    }
}

#[test]
fn ignoring_unrecognized_lines() {
    let model = parse("There was a young lady named Bright\n\
        who traveled much faster than light.\n\
        She set out one day\n\
        in a relative way,\n\
        and came back the previous night.\n");

    assert_eq!(model.ignored_lines, 5);
    assert!(model.vertices.is_empty());
}

#[test]
fn vertex_records() {
    let model = parse("v -1 1 0\nv -1.0000 0.5000 0.0000\nv 1 0 0\nv 1 1 0\n");

    assert_eq!(model.vertices[0], Tuple4D::point(-1.0, 1.0, 0.0));
    assert_eq!(model.vertices[1], Tuple4D::point(-1.0, 0.5, 0.0));
    assert_eq!(model.vertices[2], Tuple4D::point( 1.0, 0.0, 0.0));
    assert_eq!(model.vertices[3], Tuple4D::point( 1.0, 1.0, 0.0));
}

#[test]
fn parsing_triangle_faces() {
    let model = parse("v -1 1 0\nv -1 0 0\nv 1 0 0\nv 1 1 0\n\nf 1 2 3\nf 1 3 4\n");

    let t1 = triangle_at(&model.default_group, 0);
    let t2 = triangle_at(&model.default_group, 1);

    assert_eq!(t1.p1, model.vertices[0]);
    assert_eq!(t1.p2, model.vertices[1]);
    assert_eq!(t1.p3, model.vertices[2]);
    assert_eq!(t2.p1, model.vertices[0]);
    assert_eq!(t2.p2, model.vertices[2]);
    assert_eq!(t2.p3, model.vertices[3]);
}

#[test]
fn triangulating_polygons() {
    let model = parse("v -1 1 0\nv -1 0 0\nv 1 0 0\nv 1 1 0\nv 0 2 0\n\nf 1 2 3 4 5\n");
    let g = &model.default_group;

    assert_eq!(g.children().unwrap().len(), 3);

    let t1 = triangle_at(g, 0);
    let t2 = triangle_at(g, 1);
    let t3 = triangle_at(g, 2);

    assert_eq!(t1.p1, model.vertices[0]);
    assert_eq!(t1.p2, model.vertices[1]);
    assert_eq!(t1.p3, model.vertices[2]);
    assert_eq!(t2.p1, model.vertices[0]);
    assert_eq!(t2.p2, model.vertices[2]);
    assert_eq!(t2.p3, model.vertices[3]);
    assert_eq!(t3.p1, model.vertices[0]);
    assert_eq!(t3.p2, model.vertices[3]);
    assert_eq!(t3.p3, model.vertices[4]);
}

#[test]
fn triangles_in_groups() {
    let model = parse("v -1 1 0\nv -1 0 0\nv 1 0 0\nv 1 1 0\n\
        g FirstGroup\nf 1 2 3\ng SecondGroup\nf 1 3 4\n");

    let first = &model.groups["FirstGroup"];
    let second = &model.groups["SecondGroup"];

    assert_eq!(triangle_at(first, 0).p2, model.vertices[1]);
    assert_eq!(triangle_at(second, 0).p2, model.vertices[2]);
    assert!(model.default_group.children().unwrap().is_empty());
}

#[test]
fn converting_a_model_to_a_group() {
    let model = parse("v -1 1 0\nv -1 0 0\nv 1 0 0\nv 1 1 0\n\
        g FirstGroup\nf 1 2 3\ng SecondGroup\nf 1 3 4\n");

    let g = model.into_group();
    let children = g.children().unwrap();

    // The empty default group is dropped.
    assert_eq!(children.len(), 2);
    assert!(children.iter().all(|c| c.children().unwrap().len() == 1));
}

#[test]
fn vertex_normal_records() {
    let model = parse("vn 0 0 1\nvn 0.707 0 -0.707\nvn 1 2 3\n");

    assert_eq!(model.normals[0], Tuple4D::vector(0.0, 0.0, 1.0));
    assert_eq!(model.normals[1], Tuple4D::vector(0.707, 0.0, -0.707));
    assert_eq!(model.normals[2], Tuple4D::vector(1.0, 2.0, 3.0));
}

#[test]
fn faces_with_normals() {
    let model = parse("v 0 1 0\nv -1 0 0\nv 1 0 0\n\n\
        vn -1 0 0\nvn 1 0 0\nvn 0 1 0\n\n\
        f 1//3 2//1 3//2\nf 1/0/3 2/102/1 3/14/2\n");

    let children = model.default_group.children().unwrap();
    let (t1, t2) = match (children[0].ty(), children[1].ty()) {
        (ShapeType::SmoothTriangle(a), ShapeType::SmoothTriangle(b)) => (*a, *b),
        other => panic!("expected smooth triangles, found {:?}", other),
    };

    assert_eq!(t1.triangle.p1, model.vertices[0]);
    assert_eq!(t1.triangle.p2, model.vertices[1]);
    assert_eq!(t1.triangle.p3, model.vertices[2]);
    assert_eq!(t1.n1, model.normals[2]);
    assert_eq!(t1.n2, model.normals[0]);
    assert_eq!(t1.n3, model.normals[1]);
    assert_eq!(t1, t2);
}

#[test]
fn negative_indices_count_from_the_end() {
    let model = parse("v 0 1 0\nv -1 0 0\nv 1 0 0\nf -3 -2 -1\n");
    let t = triangle_at(&model.default_group, 0);

    assert_eq!(t.p1, model.vertices[0]);
    assert_eq!(t.p3, model.vertices[2]);
}

#[test]
fn degenerate_faces_are_skipped() {
    let model = parse("v 0 0 0\nv 1 0 0\nv 2 0 0\nv 0 1 0\nf 1 2 3\nf 1 2 4\n");

    assert_eq!(model.default_group.children().unwrap().len(), 1);
}

#[test]
fn malformed_data_reports_the_line() {
    let bad = [
        ("v 1 2\n", 1),
        ("v 1 two 3\n", 1),
        ("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 4\n", 4),
        ("v 0 0 0\nv 1 0 0\nv 0 1 0\n\nf 0 1 2\n", 5),
        ("v 0 0 0\nv 1 0 0\nf 1 2\n", 3),
        ("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1//1 2//1 3//1\n", 4),
        ("v 0 0 0\nv 1 0 0\nv 0 1 0\nf -4 1 2\n", 4),
    ];

    for &(text, line) in bad.iter() {
        match ObjParser::parse(text.as_bytes()) {
            Err(Error::Obj { line: l, .. }) => assert_eq!(l, line, "{:?}", text),
            other => panic!("{:?} parsed as {:?}", text, other.map(|m| m.vertices.len())),
        }
    }
}
