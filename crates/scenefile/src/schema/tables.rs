use super::{Canonical, DefaultValue as D, Family, FieldSpec as F, FieldType as T, Range, VariantSpec};

const VECTOR2: T = T::Vector(2);
const VECTOR3: T = T::Vector(3);

const ORIGIN: &[f64] = &[0.0, 0.0, 0.0];

const POINT_SAMPLE_RENDERER: &[F] = &[
    F::optional("noRenderThreads", T::UInt).default(D::Number(8.0)),
    F::optional("noDirectSamples", T::UInt).default(D::Number(1.0)),
    F::optional("noSuperSamples", T::UInt),
    F::optional("generator", T::Variant(Family::Generator)).default(D::Str("super")),
    F::optional("directSampleGenerator", T::Variant(Family::Generator)).default(D::Str("jittered")),
];

const PINHOLE_CAMERA: &[F] = &[
    F::optional("eye", VECTOR3).default(D::Numbers(&[2.0, 2.0, 1.0])),
    F::optional("focus", VECTOR3),
    F::optional("look", VECTOR3),
    F::optional("up", VECTOR3).default(D::Numbers(&[0.0, 1.0, 0.0])),
    F::optional("heightAngle", T::Real)
        .default(D::Number(45.0))
        .within(Range::open(0.0, 180.0))
        .units("degrees"),
    F::optional("aspectRatio", T::RealPositive).default(D::Number(1.0)),
    F::optional("near", T::RealPositive).default(D::Number(1.0)),
    F::optional("far", T::RealPositive).default(D::Number(100.0)),
];

const OUTPUT: &[F] = &[
    F::optional("width", T::UInt).default(D::Number(480.0)).units("pixels"),
    F::optional("height", T::UInt).default(D::Number(480.0)).units("pixels"),
    F::optional("size", VECTOR2).within(Range::NON_NEGATIVE).units("pixels"),
    F::optional("dimensions", VECTOR2).within(Range::NON_NEGATIVE).units("pixels"),
];

const POWERED_EMITTER: &[F] = &[
    F::optional("power", T::Spectrum).default(D::Number(0.0)).units("watts"),
    F::optional("glDiffuseColor", T::Color3),
    F::optional("glSpecularColor", T::Color3),
    F::optional("glAttenuation", VECTOR3),
];

const FILTER: &[F] = &[F::optional("support", T::UInt).default(D::Number(2.0))];

const MITCHELL: &[F] = &[
    F::optional("B", T::Real).default(D::Number(1.0 / 3.0)),
    F::optional("C", T::Real).default(D::Number(1.0 / 3.0)),
];

const GENERATOR: &[F] = &[
    F::optional("binWidth", T::Real),
    F::optional("binHeight", T::Real),
    F::optional("binSize", T::Real),
];

const SHAPE: &[F] = &[F::optional("name", T::String)];

pub(crate) const KD_SPLIT_PLANE: &[&str] = &["splitPlaneMiddle", "splitPlaneMedian", "splitPlaneSAH"];
pub(crate) const KD_SPLIT_AXIS: &[&str] = &["splitAxisRoundRobin", "splitAxisLongestExtent"];

const KD_TREE: &[F] = &[
    F::optional("kdSplitPlaneType", T::Enum(KD_SPLIT_PLANE)).default(D::Str("splitPlaneSAH")),
    F::optional("kdSplitAxisType", T::Enum(KD_SPLIT_AXIS)).default(D::Str("splitAxisRoundRobin")),
    F::optional("kdMinPrimitives", T::UInt).default(D::Number(3.0)),
    F::optional("kdMaxDepth", T::UInt)
        .default(D::Number(24.0))
        .within(Range::closed(0.0, 24.0)),
    F::optional("kdNoThreads", T::UInt).default(D::Number(1.0)),
    F::optional("kdPostCompress", T::Bool).default(D::Bool(true)),
    F::optional("kdCostTraversal", T::Real).default(D::Number(1.0)),
    F::optional("kdCostIntersect", T::Real),
    F::optional("kdEmptyBias", T::Real).default(D::Number(0.9)).within(Range::UNIT),
];

/// Shapes owning an accelerator may also spell the kd-tree settings inline
const ACCELERATED: &[F] = &[
    F::optional("spatialAccel", T::Variant(Family::SpatialAccel)),
    F::optional("kdSplitPlaneType", T::Enum(KD_SPLIT_PLANE)),
    F::optional("kdSplitAxisType", T::Enum(KD_SPLIT_AXIS)),
    F::optional("kdMinPrimitives", T::UInt),
    F::optional("kdMaxDepth", T::UInt).within(Range::closed(0.0, 24.0)),
    F::optional("kdNoThreads", T::UInt),
    F::optional("kdPostCompress", T::Bool),
    F::optional("kdCostTraversal", T::Real),
    F::optional("kdCostIntersect", T::Real),
    F::optional("kdEmptyBias", T::Real).within(Range::UNIT),
];

const MATERIAL: &[F] = &[
    F::optional("name", T::String),
    F::optional("bsdf", T::Variant(Family::Bsdf)).default(D::Str("diffuse")),
    F::optional("emitter", T::Variant(Family::Emitter)).default(D::Str("null")),
    F::optional("bumpMap", T::Path),
    F::optional("bumpIntensity", T::RealPositive).default(D::Number(5.0)),
    F::optional("medium", T::Variant(Family::Medium)),
    F::optional("filter", T::Variant(Family::Filter)).default(D::Str("triangle")),
    F::optional("repeatU", T::RealPositive).default(D::Number(1.0)),
    F::optional("repeatV", T::RealPositive).default(D::Number(1.0)),
];

/// Pure spelling aliases: `(family, alias, canonical tag)`
pub(super) const ALIASES: &[(Family, &str, &str)] = &[
    (Family::Renderer, "OpenGL", "preview"),
    (Family::Renderer, "bidirPathTracer", "bidirectionalPathTracer"),
    (Family::Renderer, "MLT", "mlt"),
    (Family::Bsdf, "modifiedPhong", "phong"),
    (Family::Bsdf, "dieletric", "dielectric"),
    (Family::Filter, "lanzcosSinc", "lanczosSinc"),
];

/// Tag assumed when an object of the family has no `type`
pub(super) const DEFAULT_TAGS: &[(Family, &str)] = &[
    (Family::Medium, "homogenous"),
    (Family::Output, "reconstruction"),
];

struct Builder {
    family: Family,
    specs: Vec<VariantSpec>,
}

impl Builder {
    fn family(family: Family) -> Self {
        Self {
            family,
            specs: Vec::new(),
        }
    }

    fn tag(self, tag: &'static str, own: &[F]) -> Self {
        self.grouped(tag, &[], own)
    }

    fn grouped(mut self, tag: &'static str, groups: &[(&'static str, &[F])], own: &[F]) -> Self {
        let mut fields = own.to_vec();
        for (_, group) in groups {
            fields.extend_from_slice(group);
        }
        self.specs.push(VariantSpec {
            family: self.family,
            tag,
            fields,
            shared_field_groups: groups.iter().map(|(name, _)| *name).collect(),
            canonical: None,
            open: false,
        });
        self
    }

    /// Marks the last added tag as shorthand for `canonical`
    fn canonical(mut self, canonical: Canonical) -> Self {
        if let Some(last) = self.specs.last_mut() {
            last.canonical = Some(canonical);
        }
        self
    }
}

pub(super) fn variants() -> Vec<VariantSpec> {
    let point_sample = ("pointSampleRenderer", POINT_SAMPLE_RENDERER);
    let powered = ("poweredEmitter", POWERED_EMITTER);
    let filter = ("filter", FILTER);
    let generator = ("generator", GENERATOR);
    let shape = ("shape", SHAPE);
    let accelerated = ("spatialAccel", ACCELERATED);

    let renderer = Builder::family(Family::Renderer)
        .tag("preview", &[])
        .grouped(
            "rayCaster",
            &[point_sample],
            &[F::optional("ambient", T::Spectrum).default(D::Number(0.1))],
        )
        .grouped(
            "rayTracer",
            &[point_sample],
            &[
                F::optional("ambient", T::Spectrum).default(D::Number(0.01)),
                F::optional("noIndirectSamples", T::UInt).default(D::Number(1.0)),
                F::optional("maxDepth", T::UInt).default(D::Number(5.0)),
            ],
        )
        .grouped(
            "pathTracer",
            &[point_sample],
            &[F::optional("efficientDirect", T::Bool).default(D::Bool(true))],
        )
        .grouped("bidirectionalPathTracer", &[point_sample], &[])
        .grouped(
            "photonMapper",
            &[point_sample],
            &[
                F::optional("diffuseNoGatherPhotons", T::UInt).default(D::Number(500.0)),
                F::optional("causticNoGatherPhotons", T::UInt).default(D::Number(300.0)),
                F::optional("diffuseGatherRadius", T::RealPositive).default(D::Number(1.0)),
                F::optional("causticGatherRadius", T::RealPositive).default(D::Number(1.0)),
                F::optional("diffuseNoPhotons", T::UInt).default(D::Number(60000.0)),
                F::optional("causticNoPhotons", T::UInt).default(D::Number(60000.0)),
            ],
        )
        .grouped(
            "mlt",
            &[point_sample],
            &[
                F::optional("maxDepth", T::UInt),
                F::optional("maxConsequtiveRejections", T::UInt).default(D::Number(500.0)),
                F::optional("mltBidirPathMutationProb", T::Real).default(D::Number(1.0)),
                F::optional("mltLensSubpathMutationProb", T::Real).default(D::Number(1.0)),
                F::optional("mltPerturbationPathMutationProb", T::Real).default(D::Number(1.0)),
            ],
        );

    let camera = Builder::family(Family::Camera)
        .grouped("pinhole", &[("pinholeCamera", PINHOLE_CAMERA)], &[])
        .grouped(
            "thinlens",
            &[("pinholeCamera", PINHOLE_CAMERA)],
            &[
                // zero is the pinhole limit
                F::optional("aperture", T::Real)
                    .default(D::Number(35.0))
                    .within(Range::NON_NEGATIVE)
                    .units("mm"),
                F::optional("fstop", T::RealPositive).default(D::Number(14.0)),
                F::optional("focalDistance", T::RealPositive).units("meters"),
                F::optional("focalPoint", VECTOR2)
                    .default(D::Numbers(&[0.5, 0.5]))
                    .within(Range::UNIT),
            ],
        );

    let reconstruction = [
        F::optional("filter", T::Variant(Family::Filter)).default(D::Str("lanczosSinc")),
        F::optional("tonemap", T::String),
    ];
    let output = Builder::family(Family::Output)
        .grouped("naive", &[("output", OUTPUT)], &[])
        .grouped("reconstruction", &[("output", OUTPUT)], &reconstruction)
        .grouped("default", &[("output", OUTPUT)], &reconstruction);

    let background = Builder::family(Family::Background)
        .tag("null", &[])
        .grouped("omni", &[powered], &[])
        .grouped("oriented", &[powered], &[])
        .grouped(
            "environment",
            &[powered],
            &[
                F::required("path", T::Path),
                F::optional("coords", T::Enum(&["spherical", "latLong"])).default(D::Str("spherical")),
            ],
        );

    let bsdf = Builder::family(Family::Bsdf)
        .tag("absorbent", &[])
        .tag(
            "diffuse",
            &[F::optional("kd", T::ClampedSpectrum).default(D::Number(0.5))],
        )
        .tag(
            "dielectric",
            &[
                F::optional("ks", T::ClampedSpectrum).default(D::Number(1.0)),
                F::optional("opacity", T::ClampedSpectrum).default(D::Number(1.0)),
                F::optional("transparency", T::ClampedSpectrum),
            ],
        )
        .tag(
            "phong",
            &[
                F::optional("kd", T::ClampedSpectrum).default(D::Number(0.5)),
                F::optional("ks", T::ClampedSpectrum).default(D::Number(0.5)),
                F::optional("n", T::RealPositive).default(D::Number(1.0)),
            ],
        )
        .tag(
            "specular",
            &[F::optional("ks", T::ClampedSpectrum).default(D::Number(1.0))],
        )
        .canonical(Canonical {
            tag: "dielectric",
            implied: &[("opacity", D::Number(1.0))],
        })
        .tag(
            "transmissive",
            &[F::optional("ks", T::ClampedSpectrum).default(D::Number(1.0))],
        )
        .canonical(Canonical {
            tag: "dielectric",
            implied: &[("opacity", D::Number(0.0))],
        })
        .tag(
            "aggregate",
            &[
                F::required("bsdfs", T::List(&T::Variant(Family::Bsdf))),
                F::required("weights", T::List(&T::ClampedSpectrum)),
            ],
        );

    let emitter = Builder::family(Family::Emitter)
        .tag("null", &[])
        .grouped("omni", &[powered], &[])
        .grouped("oriented", &[powered], &[]);

    let medium = Builder::family(Family::Medium).tag(
        "homogenous",
        &[F::optional("ior", T::Spectrum).default(D::Number(1.0003))],
    );

    let filters = Builder::family(Family::Filter)
        .grouped("box", &[filter], &[])
        .grouped("triangle", &[filter], &[])
        .grouped(
            "gaussian",
            &[filter],
            &[F::optional("sigma", T::RealPositive).default(D::Number(1.0))],
        )
        .grouped("mitchell", &[filter, ("mitchell", MITCHELL)], &[])
        .grouped(
            "lanczosSinc",
            &[filter, ("mitchell", MITCHELL)],
            &[F::optional("tau", T::Real).default(D::Number(3.0))],
        );

    let generators = Builder::family(Family::Generator)
        .grouped("uniform", &[generator], &[])
        .grouped("stochastic", &[generator], &[])
        .grouped("jittered", &[generator], &[])
        .grouped(
            "super",
            &[generator],
            &[
                F::optional("noSuperSamples", T::UInt).default(D::Number(4.0)),
                F::optional("subGeneratorType", T::String).default(D::Str("jittered")),
            ],
        )
        .grouped(
            "dissolve",
            &[generator],
            &[F::optional("noSuperSamples", T::UInt).default(D::Number(0.0))],
        )
        .grouped("hilbert", &[generator], &[]);

    let shapes = Builder::family(Family::Shape)
        .grouped(
            "triangle",
            &[shape],
            &[
                F::optional("vertices", T::Vector(9))
                    .default(D::Numbers(&[0.0, 0.0, 0.0, 0.0, 0.0, 0.5, 0.5, 0.0, 0.0])),
                F::optional("normals", T::Vector(9)),
                F::optional("normal", VECTOR3),
                F::optional("uvs", T::Vector(6)),
            ],
        )
        .grouped(
            "plane",
            &[shape],
            &[F::optional("vertices", T::Vector(12))],
        )
        .grouped("point", &[shape], &[])
        .grouped("cube", &[shape], &[])
        .grouped("cone", &[shape], &[])
        .grouped("cylinder", &[shape], &[])
        .grouped(
            "sphere",
            &[shape],
            &[
                F::optional("position", VECTOR3).default(D::Numbers(ORIGIN)),
                F::optional("radius", T::RealPositive).default(D::Number(0.5)),
            ],
        )
        .grouped(
            "blob",
            &[shape, accelerated],
            &[
                F::optional("threshold", T::Real).default(D::Number(0.17)),
                F::optional("resolution", VECTOR3).default(D::Numbers(&[128.0, 128.0, 128.0])),
                F::required("metaObjects", T::List(&T::Variant(Family::MetaObject))),
            ],
        )
        .grouped(
            "mesh",
            &[shape, accelerated],
            &[
                F::required("path", T::Path),
                F::optional("normalize", T::Bool).default(D::Bool(false)),
            ],
        )
        .grouped("shapeSet", &[shape, accelerated], &[]);

    let metaobjects = Builder::family(Family::MetaObject).tag(
        "ball",
        &[
            F::optional("position", VECTOR3).default(D::Numbers(ORIGIN)),
            F::optional("radius", T::RealPositive).default(D::Number(1.0)),
            F::optional("strength", T::Real).default(D::Number(1.0)),
            F::optional("negative", T::Bool).default(D::Bool(false)),
        ],
    );

    let accels = Builder::family(Family::SpatialAccel)
        .tag("naive", &[])
        .tag("kdTree", KD_TREE);

    [
        renderer,
        camera,
        output,
        background,
        bsdf,
        emitter,
        medium,
        filters,
        generators,
        shapes,
        metaobjects,
        accels,
    ]
    .into_iter()
    .flat_map(|builder| builder.specs)
    .collect()
}

pub(super) fn material_block() -> VariantSpec {
    VariantSpec {
        family: Family::Bsdf,
        tag: "material",
        fields: MATERIAL.to_vec(),
        shared_field_groups: vec![],
        canonical: None,
        open: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn no_duplicate_fields_or_tags() {
        let specs = variants();
        let mut tags = HashSet::new();
        for spec in &specs {
            assert!(tags.insert((spec.family, spec.tag)), "{} {}", spec.family, spec.tag);
            let mut names = HashSet::new();
            for field in &spec.fields {
                assert!(names.insert(field.name), "{}:{} {}", spec.family, spec.tag, field.name);
            }
        }
    }

    #[test]
    fn required_fields_have_no_default() {
        for spec in variants() {
            for field in &spec.fields {
                assert!(field.optional || field.default.is_none(), "{}", field.name);
            }
        }
    }

    #[test]
    fn defaults_match_documentation() {
        let specs = variants();
        let field = |family: Family, tag: &str, name: &str| {
            specs
                .iter()
                .find(|s| s.family == family && s.tag == tag)
                .and_then(|s| s.field(name))
                .and_then(|f| f.default)
        };
        assert_eq!(field(Family::Renderer, "photonMapper", "diffuseNoGatherPhotons"), Some(D::Number(500.0)));
        assert_eq!(field(Family::Camera, "thinlens", "aperture"), Some(D::Number(35.0)));
        assert_eq!(field(Family::Camera, "thinlens", "fstop"), Some(D::Number(14.0)));
        assert_eq!(field(Family::Shape, "blob", "threshold"), Some(D::Number(0.17)));
        assert_eq!(field(Family::Medium, "homogenous", "ior"), Some(D::Number(1.0003)));
    }
}
