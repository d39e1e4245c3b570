pub mod haar_face_detector;
pub mod xml_cascade_loader;
