use flowchart::{
    Connection, ExtractionConfig, FlowchartError, GraphRenderer, LayoutRenderer, LineDetector, OcrEngine,
    OcrError, Pipeline, Segment,
};
use image::{DynamicImage, GrayImage, Luma};
use imageproc::{drawing::draw_filled_rect_mut, rect::Rect};

const BLACK: Luma<u8> = Luma([0u8]);

fn white(width: u32, height: u32) -> GrayImage {
    GrayImage::from_pixel(width, height, Luma([255u8]))
}

/// Two boxes side by side joined by a 3px horizontal stroke that stops short of both
fn two_connected_boxes() -> DynamicImage {
    let mut img = white(260, 120);
    draw_filled_rect_mut(&mut img, Rect::at(10, 10).of_size(60, 40), BLACK);
    draw_filled_rect_mut(&mut img, Rect::at(190, 10).of_size(60, 40), BLACK);
    draw_filled_rect_mut(&mut img, Rect::at(80, 29).of_size(101, 3), BLACK);
    DynamicImage::ImageLuma8(img)
}

struct FixedLines(Vec<Segment>);

impl LineDetector for FixedLines {
    fn detect_lines(&self, _edges: &GrayImage) -> flowchart::Result<Vec<Segment>> {
        Ok(self.0.clone())
    }
}

/// Fails on regions of one width and labels the rest
struct FlakyEngine {
    fail_width: u32,
}

impl OcrEngine for FlakyEngine {
    fn recognize(&self, region: &GrayImage, _language: &str) -> Result<String, OcrError> {
        if region.width() == self.fail_width {
            return Err(OcrError::EngineUnavailable("engine went away".to_string()));
        }
        Ok(format!(" Decision {}\n", region.width()))
    }
}

#[tokio::test]
async fn test_two_boxes_joined_by_a_line() {
    let pipeline = Pipeline::builder().build().expect("Should build");
    let extraction = pipeline.process(&two_connected_boxes()).await.expect("Should process");
    let graph = &extraction.graph;

    assert_eq!(graph.nodes().len(), 2);
    assert_eq!((graph.nodes()[0].x, graph.nodes()[0].y), (10, 10));
    assert_eq!((graph.nodes()[1].x, graph.nodes()[1].y), (190, 10));

    assert!(!graph.connections().is_empty(), "The stroke should produce a connection");
    for connection in graph.connections() {
        assert_eq!(*connection, Connection { from_node_id: 0, to_node_id: 1 });
    }
}

#[tokio::test]
async fn test_deduplication_collapses_parallel_edges() {
    let pipeline = Pipeline::builder().with_deduplication().build().expect("Should build");
    let extraction = pipeline.process(&two_connected_boxes()).await.expect("Should process");
    assert_eq!(
        extraction.graph.connections(),
        &[Connection { from_node_id: 0, to_node_id: 1 }]
    );
}

#[tokio::test]
async fn test_touching_boxes_scenario_with_known_segment() {
    // Boxes at (10,10,60,40) and (130,10,60,40) joined from (70,30) to (130,30)
    let mut img = white(200, 200);
    draw_filled_rect_mut(&mut img, Rect::at(10, 10).of_size(60, 40), BLACK);
    draw_filled_rect_mut(&mut img, Rect::at(130, 10).of_size(60, 40), BLACK);

    let pipeline = Pipeline::builder()
        .set_line_detector(FixedLines(vec![Segment::new(70, 30, 130, 30)]))
        .build()
        .expect("Should build");
    let extraction = pipeline
        .process(&DynamicImage::ImageLuma8(img))
        .await
        .expect("Should process");

    assert_eq!(extraction.graph.nodes().len(), 2);
    assert_eq!(
        extraction.graph.connections(),
        &[Connection { from_node_id: 0, to_node_id: 1 }]
    );
}

#[tokio::test]
async fn test_single_box_without_lines() {
    let mut img = white(200, 200);
    draw_filled_rect_mut(&mut img, Rect::at(60, 60).of_size(60, 40), BLACK);

    let pipeline = Pipeline::builder().build().expect("Should build");
    let extraction = pipeline
        .process(&DynamicImage::ImageLuma8(img))
        .await
        .expect("Should process");

    assert_eq!(extraction.graph.nodes().len(), 1);
    assert!(extraction.graph.connections().is_empty());
}

#[tokio::test]
async fn test_line_far_from_every_node() {
    let mut img = white(400, 300);
    draw_filled_rect_mut(&mut img, Rect::at(10, 10).of_size(60, 40), BLACK);
    draw_filled_rect_mut(&mut img, Rect::at(100, 249).of_size(281, 3), BLACK);

    let pipeline = Pipeline::builder().build().expect("Should build");
    let extraction = pipeline
        .process(&DynamicImage::ImageLuma8(img))
        .await
        .expect("Should process");

    assert_eq!(extraction.graph.nodes().len(), 1);
    assert_eq!(extraction.graph.nodes()[0].width, 60);
    assert!(extraction.graph.connections().is_empty());
}

#[tokio::test]
async fn test_runs_are_identical() {
    let pipeline = Pipeline::builder().build().expect("Should build");
    let image = two_connected_boxes();

    let first = pipeline.process(&image).await.expect("Should process");
    let second = pipeline.process(&image).await.expect("Should process");
    assert_eq!(first.graph, second.graph);
}

#[tokio::test]
async fn test_ocr_failure_on_one_node_keeps_other_text() {
    let mut img = white(300, 120);
    draw_filled_rect_mut(&mut img, Rect::at(10, 10).of_size(60, 40), BLACK);
    draw_filled_rect_mut(&mut img, Rect::at(200, 10).of_size(70, 40), BLACK);

    let pipeline = Pipeline::builder()
        .set_ocr_engine(FlakyEngine { fail_width: 60 })
        .build()
        .expect("Should build");
    let extraction = pipeline
        .process(&DynamicImage::ImageLuma8(img))
        .await
        .expect("Should process");

    let nodes = extraction.graph.nodes();
    assert_eq!(nodes.len(), 2);
    assert_eq!(nodes[0].text, "");
    assert_eq!(nodes[1].text, "Decision 70");
    assert_eq!(extraction.warnings.len(), 1);
    assert_eq!(extraction.warnings[0].node_id, 0);
}

#[tokio::test]
async fn test_larger_minimum_size_drops_nodes() {
    let mut img = white(300, 200);
    draw_filled_rect_mut(&mut img, Rect::at(10, 10).of_size(40, 25), BLACK);
    draw_filled_rect_mut(&mut img, Rect::at(100, 100).of_size(120, 60), BLACK);
    let image = DynamicImage::ImageLuma8(img);

    let loose = Pipeline::builder().build().expect("Should build");
    let strict = Pipeline::builder()
        .with_config(ExtractionConfig {
            min_shape_width: 50,
            min_shape_height: 30,
            ..Default::default()
        })
        .build()
        .expect("Should build");

    let loose_nodes = loose.process(&image).await.expect("Should process").graph.nodes().len();
    let strict_nodes = strict.process(&image).await.expect("Should process").graph.nodes().len();
    assert_eq!(loose_nodes, 2);
    assert_eq!(strict_nodes, 1);
}

#[tokio::test]
async fn test_missing_file_is_invalid_image() {
    let pipeline = Pipeline::builder().build().expect("Should build");
    let result = pipeline.process_path("/nonexistent/flowchart.png").await;
    assert!(matches!(result, Err(FlowchartError::InvalidImage(_))));
}

#[tokio::test]
async fn test_layout_of_extracted_graph() {
    let pipeline = Pipeline::builder().build().expect("Should build");
    let extraction = pipeline.process(&two_connected_boxes()).await.expect("Should process");
    let connection_count = extraction.graph.connections().len();

    let layout = LayoutRenderer::from_config(pipeline.config())
        .render(extraction.graph)
        .expect("Should render");
    assert_eq!(layout.shapes.len(), 2);
    assert_eq!(layout.connectors.len(), connection_count);
    // Default scale is 0.2
    assert!((layout.shapes[1].left - 38.0).abs() < 1e-9);
}
