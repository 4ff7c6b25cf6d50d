pub mod rustface_region_detector;
